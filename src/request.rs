//! Request and response model
//!
//! Requests are identified by absolute URL. The [`Origin`] turns those URLs
//! into the origin-relative keys used by the resource manifest.

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// Logical key of the entry document
pub const ROOT_KEY: &str = "/";

/// Cache-busting query marker stripped before manifest lookup
const VERSION_QUERY: &str = "?v=";

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl FromStr for Method {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "OPTIONS" => Ok(Self::Options),
            other => Err(SyncError::User(format!("Unsupported HTTP method: {}", other))),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
        };
        write!(f, "{}", name)
    }
}

/// How a request interacts with intermediate HTTP caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Normal HTTP caching rules
    #[default]
    Default,
    /// Force revalidation against the network
    Reload,
}

/// An outgoing or intercepted request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub cache_mode: CacheMode,
}

impl Request {
    /// A plain GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: Method::Get,
            cache_mode: CacheMode::Default,
        }
    }

    /// A GET request that bypasses intermediate caches
    pub fn reload(url: impl Into<String>) -> Self {
        Self {
            cache_mode: CacheMode::Reload,
            ..Self::get(url)
        }
    }

    /// Replace the request method
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// URL used as the cache entry key (fragment removed)
    pub fn cache_url(&self) -> &str {
        match self.url.find('#') {
            Some(idx) => &self.url[..idx],
            None => &self.url,
        }
    }
}

/// A response payload with status and headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Create a response with no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: vec![],
            body: body.into(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether the status is in the 2xx range
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// The application origin (scheme, host and port) without a trailing slash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin(String);

impl Origin {
    /// Parse an origin from any absolute URL
    pub fn parse(input: &str) -> SyncResult<Self> {
        let url = Url::parse(input).map_err(|e| SyncError::OriginInvalid {
            url: input.to_string(),
            reason: e.to_string(),
        })?;

        let origin = url.origin();
        if !origin.is_tuple() {
            return Err(SyncError::OriginInvalid {
                url: input.to_string(),
                reason: "URL has no host".to_string(),
            });
        }

        Ok(Self(origin.ascii_serialization()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve a manifest key to an absolute URL
    pub fn resolve(&self, key: &str) -> String {
        format!("{}/{}", self.0, key.trim_start_matches('/'))
    }

    /// Logical key of a stored cache entry
    ///
    /// Returns `None` for URLs outside this origin.
    pub fn entry_key(&self, url: &str) -> Option<String> {
        let rest = self.relative(url)?;
        if rest.is_empty() {
            Some(ROOT_KEY.to_string())
        } else {
            Some(rest.to_string())
        }
    }

    /// Manifest lookup key of an intercepted request
    ///
    /// Strips a `?v=` version suffix and maps the bare origin, an
    /// origin-level fragment or an empty path to [`ROOT_KEY`].
    pub fn request_key(&self, url: &str) -> Option<String> {
        let mut key = self.relative(url)?;
        if let Some(idx) = key.find(VERSION_QUERY) {
            key = &key[..idx];
        }

        let fragment_root = url
            .strip_prefix(self.0.as_str())
            .is_some_and(|rest| rest.starts_with("/#"));
        if url == self.0 || fragment_root || key.is_empty() {
            return Some(ROOT_KEY.to_string());
        }
        Some(key.to_string())
    }

    /// URL text after `origin/`
    fn relative<'a>(&self, url: &'a str) -> Option<&'a str> {
        let rest = url.strip_prefix(self.0.as_str())?;
        if rest.is_empty() {
            return Some(rest);
        }
        rest.strip_prefix('/')
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

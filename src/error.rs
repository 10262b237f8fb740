//! Error types for shellcache
//!
//! All modules use `SyncResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for synchronizer operations
pub type SyncResult<T> = Result<T, SyncError>;

/// All errors that can occur in shellcache
#[derive(Error, Debug)]
pub enum SyncError {
    // Network errors
    #[error("Network request failed for {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("Bulk fetch rejected {url}: HTTP {status}")]
    BadStatus { url: String, status: u16 },

    // Cache store errors
    #[error("Cache store error in {cache}: {reason}")]
    CacheStore { cache: String, reason: String },

    #[error("Invalid cache name: {0}")]
    CacheNameInvalid(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    CacheEntryCorrupt { path: PathBuf, reason: String },

    // Manifest errors
    #[error("Invalid resource manifest: {0}")]
    ManifestInvalid(String),

    #[error("Shell bundle not found: {0}")]
    BundleNotFound(PathBuf),

    #[error("Invalid origin {url}: {reason}")]
    OriginInvalid { url: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SyncError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network failure error
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a cache store error
    pub fn cache_store(cache: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CacheStore {
            cache: cache.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error came from the network rather than the cache
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::BadStatus { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Network { .. } => Some("Check that the origin server is reachable"),
            Self::BundleNotFound(_) => {
                Some("Pass --bundle or set [bundle] path in the config file")
            }
            Self::OriginInvalid { .. } => Some("Use an absolute origin such as https://example.com"),
            Self::CacheEntryCorrupt { .. } => Some("Run: shellcache reset --yes"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SyncError::network("https://example.com/main.js", "connection refused");
        assert!(err.to_string().contains("Network request failed"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = SyncError::BundleNotFound(PathBuf::from("bundle.json"));
        assert!(err.hint().unwrap().contains("--bundle"));
        assert_eq!(SyncError::Internal("x".into()).hint(), None);
    }

    #[test]
    fn error_is_network() {
        assert!(SyncError::network("u", "r").is_network());
        assert!(SyncError::BadStatus {
            url: "u".into(),
            status: 404
        }
        .is_network());
        assert!(!SyncError::cache_store("c", "r").is_network());
    }
}

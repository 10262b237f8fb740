//! Network fetch interface
//!
//! The synchronizer only needs "request in, response or failure out".
//! [`HttpFetcher`] implements that over a blocking `ureq` agent.

use crate::config::schema::NetworkConfig;
use crate::error::{SyncError, SyncResult};
use crate::request::{CacheMode, Method, Request, Response};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Abstract network collaborator
///
/// A transport failure is an `Err`; any HTTP status, including 4xx/5xx,
/// is an `Ok` response and callers check [`Response::ok`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> SyncResult<Response>;
}

/// HTTP fetcher backed by `ureq`
#[derive(Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    user_agent: String,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher from network settings
    pub fn new(config: &NetworkConfig) -> Self {
        let agent_config = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(agent_config),
            user_agent: config.user_agent.clone(),
            max_body_bytes: u64::from(config.max_body_mb) * 1024 * 1024,
        }
    }

    fn fetch_blocking(&self, request: &Request) -> SyncResult<Response> {
        let url = request.cache_url();
        let failed = |e: ureq::Error| SyncError::network(url, e.to_string());

        let mut response = match request.method {
            Method::Get => self.apply_headers(self.agent.get(url), request).call(),
            Method::Head => self.apply_headers(self.agent.head(url), request).call(),
            other => {
                return Err(SyncError::User(format!(
                    "{} requests are never fetched by the synchronizer",
                    other
                )))
            }
        }
        .map_err(failed)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        let body = if request.method == Method::Head {
            Vec::new()
        } else {
            response
                .body_mut()
                .with_config()
                .limit(self.max_body_bytes)
                .read_to_vec()
                .map_err(failed)?
        };

        debug!("{} {} -> {} ({} bytes)", request.method, url, status, body.len());
        Ok(Response {
            status,
            headers,
            body,
        })
    }

    fn apply_headers<B>(
        &self,
        builder: ureq::RequestBuilder<B>,
        request: &Request,
    ) -> ureq::RequestBuilder<B> {
        let builder = builder.header("User-Agent", &self.user_agent);
        match request.cache_mode {
            CacheMode::Default => builder,
            CacheMode::Reload => builder
                .header("Cache-Control", "no-cache")
                .header("Pragma", "no-cache"),
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> SyncResult<Response> {
        let fetcher = self.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || fetcher.fetch_blocking(&request))
            .await
            .map_err(|e| SyncError::Internal(format!("fetch task failed: {}", e)))?
    }
}

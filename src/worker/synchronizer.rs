//! Offline cache synchronizer
//!
//! Keeps the content cache consistent with the current resource manifest
//! across deployments:
//!
//! - **install** stages the core resources in the temp cache
//! - **activate** prunes content entries whose digest changed since the
//!   stored manifest, promotes the staged entries and stores the new manifest
//! - **fetch** serves `/` online-first and every other listed resource
//!   cache-first with lazy population
//!
//! Any failure during activation deletes all three caches so the next
//! activation starts from a clean first install.

use super::lifecycle::{
    ActivationGate, ActivationOutcome, EventOutcome, FetchOutcome, HostSignals, LifecycleEvent,
    LifecyclePhase, MessageOutcome, ResponseSource, WorkerMessage,
};
use crate::error::{SyncError, SyncResult};
use crate::manifest::{CoreResources, ResourceManifest, ShellBundle};
use crate::network::Fetcher;
use crate::request::{Method, Origin, Request, Response, ROOT_KEY};
use crate::store::{CacheNames, CacheStore, NamedCache};
use futures_util::future::try_join_all;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// Origin-relative key of the single manifest cache entry
const MANIFEST_ENTRY: &str = "manifest";

/// Snapshot of cache state relative to the current manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheReport {
    pub content_entries: usize,
    pub temp_entries: usize,
    /// Number of resources in the stored manifest, if one exists
    pub stored_manifest: Option<usize>,
    /// Manifest keys with no content cache entry
    pub missing: Vec<String>,
    /// Content entries the next activation would prune
    pub stale: Vec<String>,
}

/// Offline cache synchronizer for one deployed version
pub struct Synchronizer {
    store: Arc<dyn CacheStore>,
    fetcher: Arc<dyn Fetcher>,
    origin: Origin,
    manifest: ResourceManifest,
    core: CoreResources,
    names: CacheNames,
    gate: ActivationGate,
    signals: HostSignals,
    activation: Mutex<()>,
}

impl Synchronizer {
    pub fn new(
        store: Arc<dyn CacheStore>,
        fetcher: Arc<dyn Fetcher>,
        origin: Origin,
        bundle: ShellBundle,
    ) -> Self {
        Self {
            store,
            fetcher,
            origin,
            manifest: bundle.resources,
            core: bundle.core,
            names: CacheNames::default(),
            gate: ActivationGate::new(),
            signals: HostSignals::default(),
            activation: Mutex::new(()),
        }
    }

    /// Use custom cache names
    pub fn with_cache_names(mut self, names: CacheNames) -> Self {
        self.names = names;
        self
    }

    /// Open the readiness gate for a worker that was activated by an
    /// earlier process
    pub fn resume_active(&self) {
        self.gate.set(LifecyclePhase::Activated);
    }

    pub fn phase(&self) -> LifecyclePhase {
        self.gate.phase()
    }

    pub fn signals(&self) -> &HostSignals {
        &self.signals
    }

    pub fn manifest(&self) -> &ResourceManifest {
        &self.manifest
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn cache_names(&self) -> &CacheNames {
        &self.names
    }

    /// Route a lifecycle event to its handler
    pub async fn dispatch(&self, event: LifecycleEvent) -> SyncResult<EventOutcome> {
        match event {
            LifecycleEvent::Install => Ok(EventOutcome::Installed {
                staged: self.install().await?,
            }),
            LifecycleEvent::Activate => Ok(EventOutcome::Activated(self.activate().await)),
            LifecycleEvent::Fetch(request) => Ok(EventOutcome::Fetched(self.fetch(&request).await?)),
            LifecycleEvent::Message(message) => {
                Ok(EventOutcome::Message(self.handle_message(message).await?))
            }
        }
    }

    /// Stage every core resource in the temp cache, bypassing HTTP caches
    ///
    /// Returns the number of staged entries. Skip-waiting is requested
    /// whether or not staging succeeds.
    pub async fn install(&self) -> SyncResult<usize> {
        self.gate.set(LifecyclePhase::Installing);
        self.signals.request_skip_waiting();

        let staged = async {
            let temp = self.store.open(&self.names.temp).await?;
            let requests = self
                .core
                .iter()
                .map(|key| Request::reload(self.origin.resolve(key)))
                .collect();
            self.add_all(&*temp, requests).await
        }
        .await;

        match staged {
            Ok(count) => {
                self.gate.set(LifecyclePhase::Installed);
                info!("Installed: staged {} core resources", count);
                Ok(count)
            }
            Err(e) => {
                self.gate.set(LifecyclePhase::Redundant);
                error!("Install failed: {}", e);
                Err(e)
            }
        }
    }

    /// Reconcile the content cache with the current manifest
    ///
    /// Never fails: errors trigger a full reset reported as
    /// [`ActivationOutcome::Reset`]. The readiness gate opens afterwards in
    /// every case.
    pub async fn activate(&self) -> ActivationOutcome {
        let _guard = self.activation.lock().await;
        self.gate.set(LifecyclePhase::Activating);

        let outcome = match self.try_activate().await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Failed to upgrade offline cache: {}", e);
                let reason = match self.reset().await {
                    Ok(()) => e.to_string(),
                    Err(reset_err) => format!("{} (reset also failed: {})", e, reset_err),
                };
                ActivationOutcome::Reset { reason }
            }
        };

        self.gate.set(LifecyclePhase::Activated);
        outcome
    }

    async fn try_activate(&self) -> SyncResult<ActivationOutcome> {
        let mut content = self.store.open(&self.names.content).await?;
        let temp = self.store.open(&self.names.temp).await?;
        let manifest_cache = self.store.open(&self.names.manifest).await?;
        let manifest_url = self.origin.resolve(MANIFEST_ENTRY);

        let Some(stored) = manifest_cache.lookup(&manifest_url).await? else {
            // First install: nothing in the content cache can be trusted
            self.store.delete(&self.names.content).await?;
            content = self.store.open(&self.names.content).await?;

            let promoted = promote(&*temp, &*content).await?;
            self.finish_activation(&*manifest_cache, &manifest_url).await?;
            info!("Activated fresh install with {} core resources", promoted);
            return Ok(ActivationOutcome::Fresh { promoted });
        };

        let previous = ResourceManifest::from_json(&stored.body)?;
        let mut pruned = vec![];
        let mut retained = 0;
        for url in content.keys().await? {
            if self.is_fresh(&url, &previous) {
                retained += 1;
            } else {
                content.remove(&url).await?;
                pruned.push(url);
            }
        }

        // Staged shell files win over anything retained above
        let promoted = promote(&*temp, &*content).await?;
        self.finish_activation(&*manifest_cache, &manifest_url).await?;

        info!(
            "Activated upgrade: pruned {}, retained {}, promoted {}",
            pruned.len(),
            retained,
            promoted
        );
        Ok(ActivationOutcome::Upgraded {
            pruned,
            retained,
            promoted,
        })
    }

    async fn finish_activation(
        &self,
        manifest_cache: &dyn NamedCache,
        manifest_url: &str,
    ) -> SyncResult<()> {
        self.store.delete(&self.names.temp).await?;
        let stored = Response::new(200, self.manifest.to_json()?)
            .with_header("content-type", "application/json");
        manifest_cache.put(manifest_url, stored).await?;
        self.signals.claim_clients();
        Ok(())
    }

    /// Whether a content entry survives an upgrade from `previous`
    fn is_fresh(&self, url: &str, previous: &ResourceManifest) -> bool {
        self.origin
            .entry_key(url)
            .is_some_and(|key| self.manifest.is_unchanged(&key, previous))
    }

    /// Delete all three caches
    ///
    /// Every deletion is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub async fn reset(&self) -> SyncResult<()> {
        let mut first_err = None;
        for name in self.names.all() {
            match self.store.delete(name).await {
                Ok(existed) => debug!("Reset cache {} (existed: {})", name, existed),
                Err(e) => {
                    error!("Failed to delete cache {}: {}", name, e);
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => {
                warn!("All offline caches deleted");
                Ok(())
            }
        }
    }

    /// Intercept a request
    ///
    /// Only GET requests for manifest resources are handled; everything
    /// else passes through without touching the cache.
    pub async fn fetch(&self, request: &Request) -> SyncResult<FetchOutcome> {
        if request.method != Method::Get {
            return Ok(FetchOutcome::Passthrough);
        }

        let key = match self.origin.request_key(&request.url) {
            Some(key) if self.manifest.contains(&key) => key,
            _ => {
                debug!("Passing through unlisted request {}", request.url);
                return Ok(FetchOutcome::Passthrough);
            }
        };

        if self.gate.wait().await == LifecyclePhase::Redundant {
            debug!("Worker is redundant, passing through {}", request.url);
            return Ok(FetchOutcome::Passthrough);
        }

        if key == ROOT_KEY {
            self.online_first(request).await
        } else {
            self.cache_first(request).await
        }
    }

    async fn online_first(&self, request: &Request) -> SyncResult<FetchOutcome> {
        let url = request.cache_url();
        match self.fetcher.fetch(request).await {
            Ok(response) => {
                self.store_copy(url, &response).await;
                Ok(FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(network_err) => {
                debug!("Network failed for {}, trying cache: {}", url, network_err);
                match self.lookup_content(url).await {
                    Ok(Some(response)) => Ok(FetchOutcome::Respond {
                        response,
                        source: ResponseSource::Cache,
                    }),
                    Ok(None) => Err(network_err),
                    Err(cache_err) => {
                        warn!("Cache fallback failed for {}: {}", url, cache_err);
                        Err(network_err)
                    }
                }
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> SyncResult<FetchOutcome> {
        let url = request.cache_url();
        if let Some(response) = self.lookup_content(url).await? {
            return Ok(FetchOutcome::Respond {
                response,
                source: ResponseSource::Cache,
            });
        }

        let response = self.fetcher.fetch(request).await?;
        if response.ok() {
            self.store_copy(url, &response).await;
        } else {
            debug!("Not caching {} (HTTP {})", url, response.status);
        }

        Ok(FetchOutcome::Respond {
            response,
            source: ResponseSource::Network,
        })
    }

    async fn lookup_content(&self, url: &str) -> SyncResult<Option<Response>> {
        let content = self.store.open(&self.names.content).await?;
        content.lookup(url).await
    }

    /// Write a fetched response into the content cache; failures are logged
    async fn store_copy(&self, url: &str, response: &Response) {
        let result = async {
            let content = self.store.open(&self.names.content).await?;
            content.put(url, response.clone()).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to cache {}: {}", url, e);
        }
    }

    /// Handle a page-posted command
    pub async fn handle_message(&self, message: WorkerMessage) -> SyncResult<MessageOutcome> {
        match message {
            WorkerMessage::SkipWaiting => {
                self.signals.request_skip_waiting();
                Ok(MessageOutcome::SkipWaiting)
            }
            WorkerMessage::DownloadOffline => Ok(MessageOutcome::DownloadedOffline {
                fetched: self.download_offline().await?,
            }),
        }
    }

    /// Handle a message by its wire name; unknown names are ignored
    pub async fn handle_raw_message(&self, data: &str) -> SyncResult<Option<MessageOutcome>> {
        match data.parse::<WorkerMessage>() {
            Ok(message) => self.handle_message(message).await.map(Some),
            Err(unknown) => {
                debug!("Ignoring unknown message {:?}", unknown);
                Ok(None)
            }
        }
    }

    /// Fetch and store every manifest resource missing from the content cache
    ///
    /// Returns the keys fetched. A second call with no manifest change
    /// fetches nothing.
    pub async fn download_offline(&self) -> SyncResult<Vec<String>> {
        let content = self.store.open(&self.names.content).await?;
        let present = self.resident_keys(&*content).await?;

        let missing: Vec<String> = self
            .manifest
            .keys()
            .filter(|key| !present.contains(*key))
            .map(str::to_string)
            .collect();

        if missing.is_empty() {
            debug!("Offline download: content cache already complete");
            return Ok(missing);
        }

        let requests = missing
            .iter()
            .map(|key| Request::get(self.origin.resolve(key)))
            .collect();
        self.add_all(&*content, requests).await?;

        info!("Offline download stored {} resources", missing.len());
        Ok(missing)
    }

    /// Compare the caches against the current and stored manifests
    pub async fn inspect(&self) -> SyncResult<CacheReport> {
        let content = self.store.open(&self.names.content).await?;
        let temp = self.store.open(&self.names.temp).await?;
        let manifest_cache = self.store.open(&self.names.manifest).await?;

        let previous = match manifest_cache
            .lookup(&self.origin.resolve(MANIFEST_ENTRY))
            .await?
        {
            Some(stored) => Some(ResourceManifest::from_json(&stored.body)?),
            None => None,
        };

        let content_urls = content.keys().await?;
        let present: HashSet<String> = content_urls
            .iter()
            .filter_map(|url| self.origin.entry_key(url))
            .collect();

        let missing = self
            .manifest
            .keys()
            .filter(|key| !present.contains(*key))
            .map(str::to_string)
            .collect();

        let stale = match &previous {
            Some(previous) => content_urls
                .iter()
                .filter(|url| !self.is_fresh(url, previous))
                .cloned()
                .collect(),
            None => vec![],
        };

        Ok(CacheReport {
            content_entries: content_urls.len(),
            temp_entries: temp.keys().await?.len(),
            stored_manifest: previous.map(|m| m.len()),
            missing,
            stale,
        })
    }

    async fn resident_keys(&self, cache: &dyn NamedCache) -> SyncResult<HashSet<String>> {
        Ok(cache
            .keys()
            .await?
            .iter()
            .filter_map(|url| self.origin.entry_key(url))
            .collect())
    }

    /// Fetch every request, then store all responses
    ///
    /// All-or-nothing: a transport failure or non-ok status aborts before
    /// anything is written.
    async fn add_all(&self, cache: &dyn NamedCache, requests: Vec<Request>) -> SyncResult<usize> {
        let responses = try_join_all(requests.iter().map(|request| async move {
            let response = self.fetcher.fetch(request).await?;
            if !response.ok() {
                return Err(SyncError::BadStatus {
                    url: request.url.clone(),
                    status: response.status,
                });
            }
            Ok((request.cache_url().to_string(), response))
        }))
        .await?;

        let count = responses.len();
        for (url, response) in responses {
            cache.put(&url, response).await?;
        }
        debug!("Stored {} entries in {}", count, cache.name());
        Ok(count)
    }
}

/// Copy every entry of `from` into `to`
async fn promote(from: &dyn NamedCache, to: &dyn NamedCache) -> SyncResult<usize> {
    let mut promoted = 0;
    for url in from.keys().await? {
        if let Some(response) = from.lookup(&url).await? {
            to.put(&url, response).await?;
            promoted += 1;
        }
    }
    Ok(promoted)
}

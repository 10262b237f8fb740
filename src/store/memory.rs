//! In-memory cache store
//!
//! Used by tests and embedders that do not need persistence. Individual
//! operations can be made to fail with [`MemoryCacheStore::fail_on`].

use super::{validate_cache_name, CacheStore, NamedCache};
use crate::error::{SyncError, SyncResult};
use crate::request::Response;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Open,
    DeleteCache,
    Lookup,
    Put,
    Remove,
    Keys,
}

type FailureSet = Arc<Mutex<HashSet<StoreOp>>>;

/// Named caches held in process memory
#[derive(Default)]
pub struct MemoryCacheStore {
    caches: Mutex<HashMap<String, Arc<MemoryCache>>>,
    failures: FailureSet,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail until [`MemoryCacheStore::heal`]
    pub fn fail_on(&self, op: StoreOp) {
        lock(&self.failures).insert(op);
    }

    /// Clear all injected failures
    pub fn heal(&self) {
        lock(&self.failures).clear();
    }

    /// Whether a cache currently exists
    pub fn exists(&self, name: &str) -> bool {
        lock(&self.caches).contains_key(name)
    }

    /// Number of entries in a cache, zero when it does not exist
    pub fn entry_count(&self, name: &str) -> usize {
        lock(&self.caches)
            .get(name)
            .map(|cache| lock(&cache.entries).len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn NamedCache>> {
        check(&self.failures, StoreOp::Open, name)?;
        validate_cache_name(name)?;

        let cache: Arc<dyn NamedCache> = lock(&self.caches)
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(MemoryCache {
                    name: name.to_string(),
                    entries: Mutex::new(Vec::new()),
                    failures: Arc::clone(&self.failures),
                })
            })
            .clone();
        Ok(cache)
    }

    async fn delete(&self, name: &str) -> SyncResult<bool> {
        check(&self.failures, StoreOp::DeleteCache, name)?;
        Ok(lock(&self.caches).remove(name).is_some())
    }

    async fn names(&self) -> SyncResult<Vec<String>> {
        let mut names: Vec<String> = lock(&self.caches).keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// One in-memory cache; entries kept in insertion order
pub struct MemoryCache {
    name: String,
    entries: Mutex<Vec<(String, Response)>>,
    failures: FailureSet,
}

#[async_trait]
impl NamedCache for MemoryCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, url: &str) -> SyncResult<Option<Response>> {
        check(&self.failures, StoreOp::Lookup, &self.name)?;
        Ok(lock(&self.entries)
            .iter()
            .find(|(k, _)| k == url)
            .map(|(_, r)| r.clone()))
    }

    async fn put(&self, url: &str, response: Response) -> SyncResult<()> {
        check(&self.failures, StoreOp::Put, &self.name)?;
        let mut entries = lock(&self.entries);
        entries.retain(|(k, _)| k != url);
        entries.push((url.to_string(), response));
        Ok(())
    }

    async fn remove(&self, url: &str) -> SyncResult<bool> {
        check(&self.failures, StoreOp::Remove, &self.name)?;
        let mut entries = lock(&self.entries);
        let before = entries.len();
        entries.retain(|(k, _)| k != url);
        Ok(entries.len() != before)
    }

    async fn keys(&self) -> SyncResult<Vec<String>> {
        check(&self.failures, StoreOp::Keys, &self.name)?;
        Ok(lock(&self.entries).iter().map(|(k, _)| k.clone()).collect())
    }
}

fn check(failures: &FailureSet, op: StoreOp, cache: &str) -> SyncResult<()> {
    if lock(failures).contains(&op) {
        return Err(SyncError::cache_store(cache, format!("injected {:?} failure", op)));
    }
    Ok(())
}

// Poisoning is ignored: every mutation is a single step.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

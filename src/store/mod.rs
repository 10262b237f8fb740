//! Named cache stores
//!
//! A [`CacheStore`] holds any number of named caches, each mapping a request
//! URL to a stored [`Response`]. Caches are created lazily by
//! [`CacheStore::open`] and live until [`CacheStore::delete`].
//!
//! | Cache | Contents |
//! |-------|----------|
//! | content | every resource served to the application |
//! | temp | core resources staged during install |
//! | manifest | the manifest the content cache was installed under |
//!
//! A handle obtained from `open` keeps referring to the cache it was opened
//! against; after the cache is deleted the handle is detached and a fresh
//! `open` is needed to see the new, empty cache. Nothing done through a
//! detached handle ever reaches a cache opened later under the same name:
//! the memory store keeps the orphaned entries, the disk store fails.

pub mod disk;
pub mod memory;

pub use disk::DiskCacheStore;
pub use memory::{MemoryCacheStore, StoreOp};

use crate::config::schema::StorageConfig;
use crate::error::{SyncError, SyncResult};
use crate::request::Response;
use async_trait::async_trait;
use std::sync::Arc;

/// Collection of named caches
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a cache, creating it if it does not exist
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn NamedCache>>;

    /// Delete a whole cache, returning whether it existed
    async fn delete(&self, name: &str) -> SyncResult<bool>;

    /// Names of all existing caches
    async fn names(&self) -> SyncResult<Vec<String>>;
}

/// A single named cache keyed by request URL
#[async_trait]
pub trait NamedCache: Send + Sync {
    fn name(&self) -> &str;

    /// Look up the response stored for a URL
    async fn lookup(&self, url: &str) -> SyncResult<Option<Response>>;

    /// Store a response, replacing any previous entry
    async fn put(&self, url: &str, response: Response) -> SyncResult<()>;

    /// Remove an entry, returning whether it existed
    async fn remove(&self, url: &str) -> SyncResult<bool>;

    /// URLs of all entries in insertion order
    async fn keys(&self) -> SyncResult<Vec<String>>;
}

/// Names of the three caches the synchronizer works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub content: String,
    pub temp: String,
    pub manifest: String,
}

impl CacheNames {
    /// All three names, content first
    pub fn all(&self) -> [&str; 3] {
        [&self.content, &self.temp, &self.manifest]
    }
}

impl Default for CacheNames {
    fn default() -> Self {
        Self::from(&StorageConfig::default())
    }
}

impl From<&StorageConfig> for CacheNames {
    fn from(config: &StorageConfig) -> Self {
        Self {
            content: config.content_cache.clone(),
            temp: config.temp_cache.clone(),
            manifest: config.manifest_cache.clone(),
        }
    }
}

/// Reject names that cannot be used as a single path component
pub(crate) fn validate_cache_name(name: &str) -> SyncResult<()> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid {
        Ok(())
    } else {
        Err(SyncError::CacheNameInvalid(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_name_validation() {
        assert!(validate_cache_name("shell-app-cache").is_ok());
        assert!(validate_cache_name("v1.2_cache").is_ok());
        assert!(validate_cache_name("").is_err());
        assert!(validate_cache_name("..").is_err());
        assert!(validate_cache_name("a/b").is_err());
        assert!(validate_cache_name("space name").is_err());
    }

    #[test]
    fn default_names_are_distinct() {
        let names = CacheNames::default();
        let [content, temp, manifest] = names.all();
        assert_ne!(content, temp);
        assert_ne!(temp, manifest);
        assert_ne!(content, manifest);
    }
}

//! Resource manifest and core resource set
//!
//! Both are build-time artifacts produced by the asset bundler and shipped
//! together as a shell bundle:
//!
//! ```json
//! {
//!   "resources": { "main.dart.js": "f791cc..", "/": "5151c8.." },
//!   "core": ["main.dart.js", "index.html"]
//! }
//! ```

use crate::error::{SyncError, SyncResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Mapping of resource path to content digest for one deployed version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest {
    entries: BTreeMap<String, String>,
}

impl ResourceManifest {
    /// Build a manifest from key/hash pairs
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Decode a manifest previously written with [`ResourceManifest::to_json`]
    pub fn from_json(bytes: &[u8]) -> SyncResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize as a flat JSON object
    pub fn to_json(&self) -> SyncResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Digest recorded for a key
    pub fn hash(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` is listed here with the same digest as in `previous`
    pub fn is_unchanged(&self, key: &str, previous: &ResourceManifest) -> bool {
        match self.hash(key) {
            Some(hash) => previous.hash(key) == Some(hash),
            None => false,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Ordered list of resources required before the shell can boot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CoreResources(Vec<String>);

impl CoreResources {
    pub fn new<K: Into<String>>(keys: impl IntoIterator<Item = K>) -> Self {
        Self(keys.into_iter().map(Into::into).collect())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Manifest and core set for one deployed version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellBundle {
    pub resources: ResourceManifest,
    #[serde(default)]
    pub core: CoreResources,
}

impl ShellBundle {
    pub fn new(resources: ResourceManifest, core: CoreResources) -> SyncResult<Self> {
        let bundle = Self { resources, core };
        bundle.validate()?;
        Ok(bundle)
    }

    /// Load and validate a bundle from a JSON file on disk
    pub async fn from_file(path: &Path) -> SyncResult<Self> {
        if !path.exists() {
            return Err(SyncError::BundleNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read(path).await.map_err(|e| {
            SyncError::io(format!("reading shell bundle {}", path.display()), e)
        })?;
        Self::parse(&content)
    }

    /// Parse and validate a bundle from JSON
    pub fn parse(content: &[u8]) -> SyncResult<Self> {
        let bundle: Self = serde_json::from_slice(content)
            .map_err(|e| SyncError::ManifestInvalid(e.to_string()))?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> SyncResult<()> {
        if let Some((key, _)) = self.resources.entries.iter().find(|(_, h)| h.is_empty()) {
            return Err(SyncError::ManifestInvalid(format!(
                "resource '{}' has an empty digest",
                key
            )));
        }

        if let Some(key) = self.core.iter().find(|k| !self.resources.contains(k)) {
            return Err(SyncError::ManifestInvalid(format!(
                "core resource '{}' is not listed in the manifest",
                key
            )));
        }

        Ok(())
    }
}

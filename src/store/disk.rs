//! Filesystem-backed cache store
//!
//! Layout under the storage root:
//!
//! ```text
//! <root>/<cache-name>/<sha256(url)>.body   response body
//! <root>/<cache-name>/<sha256(url)>.meta   JSON: url, status, headers, stored_at
//! <root>/<cache-name>/.generation          id of this incarnation of the cache
//! ```
//!
//! The body is written first and the metadata is renamed into place last,
//! so an entry exists exactly when its `.meta` file does.
//!
//! A handle remembers the generation it was opened against. Once the cache
//! is deleted (and possibly recreated) every operation through the old
//! handle fails instead of touching the new directory.

use super::{validate_cache_name, CacheStore, NamedCache};
use crate::error::{SyncError, SyncResult};
use crate::request::Response;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

const META_EXT: &str = "meta";
const BODY_EXT: &str = "body";
const GENERATION_FILE: &str = ".generation";

/// Cache store rooted at a directory
#[derive(Debug, Clone)]
pub struct DiskCacheStore {
    root: PathBuf,
}

impl DiskCacheStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl CacheStore for DiskCacheStore {
    async fn open(&self, name: &str) -> SyncResult<Arc<dyn NamedCache>> {
        validate_cache_name(name)?;
        let dir = self.root.join(name);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| SyncError::io(format!("creating cache directory {}", dir.display()), e))?;

        let generation = claim_generation(&dir).await?;
        Ok(Arc::new(DiskCache {
            name: name.to_string(),
            dir,
            generation,
        }))
    }

    async fn delete(&self, name: &str) -> SyncResult<bool> {
        validate_cache_name(name)?;
        let dir = self.root.join(name);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!("Deleted cache directory {}", dir.display());
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SyncError::io(
                format!("deleting cache directory {}", dir.display()),
                e,
            )),
        }
    }

    async fn names(&self) -> SyncResult<Vec<String>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(SyncError::io("reading cache store root", e)),
        };

        let mut names = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io("reading cache store entry", e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if let (true, Some(name)) = (is_dir, entry.file_name().to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

/// Metadata persisted next to each body file
#[derive(Debug, Clone, Serialize, Deserialize)]
struct EntryMeta {
    url: String,
    status: u16,
    headers: Vec<(String, String)>,
    stored_at: DateTime<Utc>,
}

/// One cache directory
#[derive(Debug)]
pub struct DiskCache {
    name: String,
    dir: PathBuf,
    generation: String,
}

impl DiskCache {
    /// Fail unless the directory still holds the cache this handle opened
    async fn ensure_attached(&self) -> SyncResult<()> {
        match read_generation(&self.dir).await? {
            Some(current) if current == self.generation => Ok(()),
            _ => Err(SyncError::cache_store(
                &self.name,
                "cache was deleted after this handle was opened",
            )),
        }
    }

    fn entry_path(&self, url: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", entry_id(url), ext))
    }

    async fn read_meta(&self, path: &Path) -> SyncResult<Option<EntryMeta>> {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::io(
                    format!("reading cache metadata {}", path.display()),
                    e,
                ))
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| SyncError::CacheEntryCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> SyncResult<()> {
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        fs::write(&tmp, bytes)
            .await
            .map_err(|e| SyncError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, path)
            .await
            .map_err(|e| SyncError::io(format!("renaming into {}", path.display()), e))
    }
}

#[async_trait]
impl NamedCache for DiskCache {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lookup(&self, url: &str) -> SyncResult<Option<Response>> {
        self.ensure_attached().await?;
        let Some(meta) = self.read_meta(&self.entry_path(url, META_EXT)).await? else {
            return Ok(None);
        };

        let body_path = self.entry_path(url, BODY_EXT);
        let body = match fs::read(&body_path).await {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = ?body_path, "Cache metadata without body, treating as miss");
                return Ok(None);
            }
            Err(e) => {
                return Err(SyncError::io(
                    format!("reading cache body {}", body_path.display()),
                    e,
                ))
            }
        };

        Ok(Some(Response {
            status: meta.status,
            headers: meta.headers,
            body,
        }))
    }

    async fn put(&self, url: &str, response: Response) -> SyncResult<()> {
        self.ensure_attached().await?;
        let meta = EntryMeta {
            url: url.to_string(),
            status: response.status,
            headers: response.headers,
            stored_at: Utc::now(),
        };

        // Body before metadata: the .meta file marks the entry as present
        self.write_atomic(&self.entry_path(url, BODY_EXT), &response.body)
            .await?;
        self.write_atomic(&self.entry_path(url, META_EXT), &serde_json::to_vec(&meta)?)
            .await
    }

    async fn remove(&self, url: &str) -> SyncResult<bool> {
        self.ensure_attached().await?;
        let meta_path = self.entry_path(url, META_EXT);
        let existed = match fs::remove_file(&meta_path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                return Err(SyncError::io(
                    format!("removing {}", meta_path.display()),
                    e,
                ))
            }
        };

        let body_path = self.entry_path(url, BODY_EXT);
        if let Err(e) = fs::remove_file(&body_path).await {
            if e.kind() != ErrorKind::NotFound {
                return Err(SyncError::io(format!("removing {}", body_path.display()), e));
            }
        }

        Ok(existed)
    }

    async fn keys(&self) -> SyncResult<Vec<String>> {
        self.ensure_attached().await?;
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                return Err(SyncError::io(
                    format!("listing cache {}", self.dir.display()),
                    e,
                ))
            }
        };

        let mut metas = vec![];
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| SyncError::io("reading cache entry", e))?
        {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == META_EXT) {
                if let Some(meta) = self.read_meta(&path).await? {
                    metas.push(meta);
                }
            }
        }

        metas.sort_by(|a, b| a.stored_at.cmp(&b.stored_at).then_with(|| a.url.cmp(&b.url)));
        Ok(metas.into_iter().map(|m| m.url).collect())
    }
}

/// Read the generation of the cache in `dir`, if it exists
async fn read_generation(dir: &Path) -> SyncResult<Option<String>> {
    let path = dir.join(GENERATION_FILE);
    match fs::read_to_string(&path).await {
        Ok(id) => Ok(Some(id)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::io(format!("reading {}", path.display()), e)),
    }
}

/// Return the generation of the cache in `dir`, creating one if needed
///
/// The id is written to a scratch file and hard-linked into place, so
/// concurrent openers agree on a single generation.
async fn claim_generation(dir: &Path) -> SyncResult<String> {
    if let Some(id) = read_generation(dir).await? {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    let path = dir.join(GENERATION_FILE);
    let scratch = dir.join(format!("{}.{}.tmp", GENERATION_FILE, id));
    fs::write(&scratch, &id)
        .await
        .map_err(|e| SyncError::io(format!("writing {}", scratch.display()), e))?;

    let linked = fs::hard_link(&scratch, &path).await;
    // Best effort: the scratch name is unique to this call
    let _ = fs::remove_file(&scratch).await;

    match linked {
        Ok(()) => {
            debug!("New cache generation {} in {}", id, dir.display());
            Ok(id)
        }
        Err(e) if e.kind() == ErrorKind::AlreadyExists => read_generation(dir)
            .await?
            .ok_or_else(|| SyncError::cache_store(dir.display().to_string(), "generation vanished")),
        Err(e) => Err(SyncError::io(format!("creating {}", path.display()), e)),
    }
}

/// Stable file stem for a URL
fn entry_id(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

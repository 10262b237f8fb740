//! Configuration loading for shellcache
//!
//! Settings come from three layers, later ones winning: built-in defaults,
//! the TOML file, and the `--origin`/`--bundle`/`--store` flags. The merged
//! result is validated once so commands can rely on it.

pub mod schema;

pub use schema::Config;

use crate::error::{SyncError, SyncResult};
use crate::request::Origin;
use crate::store::validate_cache_name;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Command-line values that replace file settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub origin: Option<String>,
    pub bundle: Option<PathBuf>,
    pub store: Option<PathBuf>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(origin) = self.origin {
            config.origin.url = origin;
        }
        if let Some(bundle) = self.bundle {
            config.bundle.path = bundle;
        }
        if let Some(store) = self.store {
            config.storage.root = Some(store);
        }
    }
}

/// Locates, loads and saves the config file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Use `path` if given, otherwise `~/.config/shellcache/config.toml`
    pub fn locate(path: Option<PathBuf>) -> Self {
        Self {
            config_path: path.unwrap_or_else(Self::default_config_path),
        }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("config.toml")
    }

    /// Default cache store root under the platform state directory
    pub fn default_store_root() -> PathBuf {
        dirs::state_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shellcache")
            .join("caches")
    }

    /// Store root for a config, falling back to the default
    pub fn store_root(config: &Config) -> PathBuf {
        config
            .storage
            .root
            .clone()
            .unwrap_or_else(Self::default_store_root)
    }

    /// Read the file (a missing file means defaults), apply overrides and
    /// validate the result
    pub async fn load(&self, overrides: Overrides) -> SyncResult<Config> {
        let mut config = match fs::read_to_string(&self.config_path).await {
            Ok(content) => toml::from_str(&content).map_err(|e| self.invalid(e.to_string()))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", self.config_path.display());
                Config::default()
            }
            Err(e) => {
                return Err(SyncError::io(
                    format!("reading config from {}", self.config_path.display()),
                    e,
                ))
            }
        };

        overrides.apply(&mut config);
        self.validate(&config)?;
        Ok(config)
    }

    fn validate(&self, config: &Config) -> SyncResult<()> {
        Origin::parse(&config.origin.url).map_err(|e| self.invalid(e.to_string()))?;

        let storage = &config.storage;
        for name in [
            &storage.content_cache,
            &storage.temp_cache,
            &storage.manifest_cache,
        ] {
            validate_cache_name(name).map_err(|e| self.invalid(e.to_string()))?;
        }
        if storage.content_cache == storage.temp_cache
            || storage.content_cache == storage.manifest_cache
            || storage.temp_cache == storage.manifest_cache
        {
            return Err(self.invalid("storage cache names must be distinct".to_string()));
        }

        if config.network.timeout_secs == 0 {
            return Err(self.invalid("network.timeout_secs must be positive".to_string()));
        }

        match config.general.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(self.invalid(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                other
            ))),
        }
    }

    fn invalid(&self, reason: String) -> SyncError {
        SyncError::ConfigInvalid {
            path: self.config_path.clone(),
            reason,
        }
    }

    /// Write a config, creating the parent directory
    pub async fn save(&self, config: &Config) -> SyncResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SyncError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

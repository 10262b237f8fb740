//! Configuration schema for shellcache
//!
//! Configuration is stored at `~/.config/shellcache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Application origin
    pub origin: OriginConfig,

    /// Shell bundle location
    pub bundle: BundleConfig,

    /// Cache storage settings
    pub storage: StorageConfig,

    /// HTTP client settings
    pub network: NetworkConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Origin the shell is served from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    pub url: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
        }
    }
}

/// Shell bundle (manifest + core set) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Path to the bundle JSON, relative paths resolve against the working directory
    pub path: PathBuf,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("shell-bundle.json"),
        }
    }
}

/// Cache storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store root directory (defaults to the state directory)
    pub root: Option<PathBuf>,

    /// Durable content cache name
    pub content_cache: String,

    /// Install staging cache name
    pub temp_cache: String,

    /// Stored manifest cache name
    pub manifest_cache: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: None,
            content_cache: "shell-app-cache".to_string(),
            temp_cache: "shell-temp-cache".to_string(),
            manifest_cache: "shell-app-manifest".to_string(),
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Whole-request timeout in seconds
    pub timeout_secs: u64,

    /// Largest response body accepted, in MB
    pub max_body_mb: u32,

    /// User-Agent header sent with every request
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_body_mb: 64,
            user_agent: format!("shellcache/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

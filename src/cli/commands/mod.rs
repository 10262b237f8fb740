//! CLI command implementations

pub mod config;
pub mod fetch;
pub mod lifecycle;
pub mod message;
pub mod reset;
pub mod status;

pub use config::execute as config;
pub use fetch::execute as fetch;
pub use lifecycle::{activate, install, update};
pub use message::execute as message;
pub use reset::execute as reset;
pub use status::execute as status;

use crate::config::{Config, ConfigManager};
use crate::error::SyncResult;
use crate::manifest::ShellBundle;
use crate::network::HttpFetcher;
use crate::request::Origin;
use crate::store::{CacheNames, DiskCacheStore};
use crate::worker::Synchronizer;
use std::sync::Arc;
use tracing::debug;

/// Build a synchronizer over the on-disk store and HTTP network
pub(crate) async fn synchronizer(config: &Config) -> SyncResult<Synchronizer> {
    let origin = Origin::parse(&config.origin.url)?;
    let bundle = ShellBundle::from_file(&config.bundle.path).await?;
    let root = ConfigManager::store_root(config);

    debug!(
        "Origin {}, {} resources, store at {}",
        origin,
        bundle.resources.len(),
        root.display()
    );

    let store = Arc::new(DiskCacheStore::new(root));
    let fetcher = Arc::new(HttpFetcher::new(&config.network));
    Ok(Synchronizer::new(store, fetcher, origin, bundle)
        .with_cache_names(CacheNames::from(&config.storage)))
}

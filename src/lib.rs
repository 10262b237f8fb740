//! shellcache - Offline cache synchronizer for web application shells
//!
//! Keeps a versioned cache of static resources consistent with a build-time
//! manifest, pruning only what changed between deployments.

pub mod cli;
pub mod config;
pub mod error;
pub mod manifest;
pub mod network;
pub mod request;
pub mod store;
pub mod worker;

pub use error::{SyncError, SyncResult};
pub use worker::Synchronizer;

//! Install, activate and update commands

use crate::cli::commands::synchronizer;
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::worker::{ActivationOutcome, Synchronizer};
use console::style;

/// Execute the install command
pub async fn install(config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    run_install(&sync).await
}

/// Execute the activate command
pub async fn activate(config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    run_activate(&sync).await
}

/// Execute the update command
pub async fn update(config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    run_install(&sync).await?;
    run_activate(&sync).await
}

async fn run_install(sync: &Synchronizer) -> SyncResult<()> {
    let staged = sync.install().await?;
    println!(
        "{} Staged {} core resources in {}",
        style("✓").green(),
        staged,
        style(&sync.cache_names().temp).cyan()
    );
    Ok(())
}

async fn run_activate(sync: &Synchronizer) -> SyncResult<()> {
    match sync.activate().await {
        ActivationOutcome::Fresh { promoted } => {
            println!(
                "{} Fresh install: {} resources promoted to {}",
                style("✓").green(),
                promoted,
                style(&sync.cache_names().content).cyan()
            );
            Ok(())
        }
        ActivationOutcome::Upgraded {
            pruned,
            retained,
            promoted,
        } => {
            println!(
                "{} Upgraded: {} retained, {} pruned, {} promoted",
                style("✓").green(),
                retained,
                pruned.len(),
                promoted
            );
            for url in &pruned {
                println!("  {} {}", style("-").red(), url);
            }
            Ok(())
        }
        ActivationOutcome::Reset { reason } => Err(SyncError::User(format!(
            "Activation failed and all offline caches were deleted: {}",
            reason
        ))),
    }
}

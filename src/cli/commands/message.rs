//! Message command - post a command message to the worker

use crate::cli::args::{MessageArgs, MessageKind};
use crate::cli::commands::synchronizer;
use crate::config::Config;
use crate::error::SyncResult;
use crate::worker::{MessageOutcome, WorkerMessage};
use console::style;

/// Execute the message command
pub async fn execute(args: MessageArgs, config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    sync.resume_active();

    let message = match args.message {
        MessageKind::SkipWaiting => WorkerMessage::SkipWaiting,
        MessageKind::DownloadOffline => WorkerMessage::DownloadOffline,
    };

    match sync.handle_message(message).await? {
        MessageOutcome::SkipWaiting => {
            println!("{} Skip-waiting requested", style("✓").green());
        }
        MessageOutcome::DownloadedOffline { fetched } if fetched.is_empty() => {
            println!("{} Content cache already complete", style("✓").green());
        }
        MessageOutcome::DownloadedOffline { fetched } => {
            println!(
                "{} Downloaded {} resources for offline use",
                style("✓").green(),
                fetched.len()
            );
            for key in &fetched {
                println!("  {} {}", style("+").green(), key);
            }
        }
    }

    Ok(())
}

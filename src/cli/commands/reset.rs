//! Reset command - delete every offline cache

use crate::cli::args::ResetArgs;
use crate::cli::commands::synchronizer;
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use console::style;
use std::io::{self, Write};

/// Execute the reset command
pub async fn execute(args: ResetArgs, config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;

    if !args.yes {
        print!(
            "Delete caches {}? The next activation will re-download everything. [y/N] ",
            sync.cache_names().all().join(", ")
        );
        io::stdout()
            .flush()
            .map_err(|e| SyncError::io("flushing stdout", e))?;

        let mut input = String::new();
        io::stdin()
            .read_line(&mut input)
            .map_err(|e| SyncError::io("reading confirmation", e))?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    sync.reset().await?;
    println!("{} All offline caches deleted", style("✓").green());
    Ok(())
}

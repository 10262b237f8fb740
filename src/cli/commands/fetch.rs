//! Fetch command - serve one request through the synchronizer

use crate::cli::args::FetchArgs;
use crate::cli::commands::synchronizer;
use crate::config::Config;
use crate::error::{SyncError, SyncResult};
use crate::request::{Method, Request};
use crate::worker::FetchOutcome;
use console::style;
use std::io::Write;

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    // The store on disk belongs to an already activated worker
    sync.resume_active();

    let method: Method = args.method.parse()?;
    let url = if args.url.contains("://") {
        args.url.clone()
    } else {
        sync.origin().resolve(&args.url)
    };

    let outcome = sync.fetch(&Request::get(&url).with_method(method)).await?;
    let (response, source) = match outcome {
        FetchOutcome::Passthrough => {
            eprintln!(
                "{} {} {} not intercepted, default network handling applies",
                style("!").yellow(),
                method,
                url
            );
            return Ok(());
        }
        FetchOutcome::Respond { response, source } => (response, source),
    };

    eprintln!(
        "{} HTTP {} from {} ({} bytes)",
        if response.ok() {
            style("✓").green()
        } else {
            style("✗").red()
        },
        response.status,
        style(source).cyan(),
        response.body.len()
    );

    match args.output {
        Some(path) => tokio::fs::write(&path, &response.body)
            .await
            .map_err(|e| SyncError::io(format!("writing {}", path.display()), e))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|()| stdout.flush())
                .map_err(|e| SyncError::io("writing response to stdout", e))?;
        }
    }

    Ok(())
}

//! shellcache - Offline cache synchronizer
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use shellcache::cli::{commands, Cli, Commands};
use shellcache::config::{ConfigManager, Overrides};
use shellcache::error::SyncResult;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> SyncResult<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::locate(cli.config);
    let config = config_manager
        .load(Overrides {
            origin: cli.origin,
            bundle: cli.bundle,
            store: cli.store,
        })
        .await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("shellcache=warn"),
        1 => EnvFilter::new("shellcache=info"),
        _ => EnvFilter::new("shellcache=debug"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if config.general.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.without_time().init();
    }

    debug!("Using config at {}", config_manager.path().display());

    match cli.command {
        Commands::Install => commands::install(&config).await,
        Commands::Activate => commands::activate(&config).await,
        Commands::Update => commands::update(&config).await,
        Commands::Fetch(args) => commands::fetch(args, &config).await,
        Commands::Message(args) => commands::message(args, &config).await,
        Commands::Status(args) => commands::status(args, &config).await,
        Commands::Reset(args) => commands::reset(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

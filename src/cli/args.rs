//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// shellcache - Offline cache synchronizer
///
/// Stages, activates and serves a versioned offline copy of a web
/// application shell.
#[derive(Parser, Debug)]
#[command(name = "shellcache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SHELLCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application origin (overrides [origin] url)
    #[arg(long, global = true)]
    pub origin: Option<String>,

    /// Shell bundle JSON (overrides [bundle] path)
    #[arg(long, global = true)]
    pub bundle: Option<PathBuf>,

    /// Cache store directory (overrides [storage] root)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stage core resources in the temp cache
    Install,

    /// Reconcile the content cache with the current manifest
    Activate,

    /// Install then activate
    Update,

    /// Serve a request through the synchronizer
    Fetch(FetchArgs),

    /// Post a command message to the worker
    Message(MessageArgs),

    /// Show cache state against the current manifest
    Status(StatusArgs),

    /// Delete every offline cache
    Reset(ResetArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Absolute URL or origin-relative path
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message to post
    pub message: MessageKind,
}

/// Worker messages accepted on the command line
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MessageKind {
    /// Activate a waiting update immediately
    SkipWaiting,
    /// Fetch every resource missing from the content cache
    DownloadOffline,
}

/// Arguments for the status command
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the reset command
#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Skip confirmation
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for status
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
}

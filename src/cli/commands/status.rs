//! Status command - show cache state against the current manifest

use crate::cli::args::{OutputFormat, StatusArgs};
use crate::cli::commands::synchronizer;
use crate::config::Config;
use crate::error::SyncResult;
use crate::worker::CacheReport;
use console::style;

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> SyncResult<()> {
    let sync = synchronizer(config).await?;
    let report = sync.inspect().await?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Table => print_table(
            &report,
            sync.origin().as_str(),
            sync.manifest().len(),
        ),
    }

    Ok(())
}

fn print_table(report: &CacheReport, origin: &str, listed: usize) {
    println!("{}", style("Offline cache").bold());
    println!("  {:<18} {}", "Origin", origin);
    println!("  {:<18} {}", "Listed resources", listed);
    println!(
        "  {:<18} {}",
        "Stored manifest",
        match report.stored_manifest {
            Some(n) => format!("{} resources", n),
            None => style("none (next activation is a first install)")
                .dim()
                .to_string(),
        }
    );
    println!("  {:<18} {}", "Content entries", report.content_entries);
    println!("  {:<18} {}", "Staged entries", report.temp_entries);

    if report.missing.is_empty() {
        println!("  {:<18} {}", "Missing", style("none").green());
    } else {
        println!(
            "  {:<18} {}",
            "Missing",
            style(report.missing.len()).yellow()
        );
        for key in &report.missing {
            println!("    {} {}", style("·").dim(), key);
        }
    }

    if !report.stale.is_empty() {
        println!(
            "  {:<18} {}",
            "Stale",
            style(report.stale.len()).red()
        );
        for url in &report.stale {
            println!("    {} {}", style("·").dim(), url);
        }
    }
}

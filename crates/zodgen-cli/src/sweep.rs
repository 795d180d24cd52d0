//! # Sweep Subcommand
//!
//! Runs one full reconciliation of the output tree and exits. Exit code 1
//! when any file failed.

use anyhow::{Context, Result};
use clap::Args;
use zodgen_core::Config;
use zodgen_sync::{SyncCoordinator, SyncReport};

use crate::settings::FrontEndArgs;

/// Arguments for the sweep subcommand.
#[derive(Args, Debug)]
pub struct SweepArgs {
    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub front_end: FrontEndArgs,
}

/// Execute the sweep subcommand.
pub fn run_sweep(args: &SweepArgs, config: &Config) -> Result<u8> {
    let coordinator = SyncCoordinator::new(config.clone(), args.front_end.front_end()?);
    let report = coordinator.sweep();

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{json}");
    } else {
        print_summary(&report);
    }
    Ok(if report.is_clean() { 0 } else { 1 })
}

/// One line per category with a non-zero count.
pub fn print_summary(report: &SyncReport) {
    let rows = [
        ("generated", &report.generated),
        ("updated", &report.updated),
        ("unchanged", &report.unchanged),
        ("deleted", &report.deleted),
        ("failed", &report.failed),
    ];
    for (label, paths) in rows {
        if !paths.is_empty() {
            println!("  {label:<10} {}", paths.len());
        }
    }
}

//! # zodgen CLI entry point
//!
//! Parses command-line arguments, initialises logging and dispatches to
//! subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use zodgen_cli::convert::{run_convert, ConvertArgs};
use zodgen_cli::paths::{run_paths, PathsArgs};
use zodgen_cli::settings::ConfigArgs;
use zodgen_cli::sweep::{run_sweep, SweepArgs};
use zodgen_cli::watch::{run_watch, WatchArgs};

/// Generate Zod schemas from Sorbet struct and enum declarations.
#[derive(Parser, Debug)]
#[command(name = "zodgen", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Write log lines to stderr as JSON objects.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(flatten)]
    settings: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile one source unit.
    Convert(ConvertArgs),

    /// Reconcile the output tree with the source tree once.
    Sweep(SweepArgs),

    /// Sweep, then keep the output tree in sync until Ctrl-C.
    Watch(WatchArgs),

    /// Print the output path of each source unit.
    Paths(PathsArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        logs.json().init();
    } else {
        logs.init();
    }

    let result = cli.settings.resolve().and_then(|config| match &cli.command {
        Commands::Convert(args) => run_convert(args, &config),
        Commands::Sweep(args) => run_sweep(args, &config),
        Commands::Watch(args) => run_watch(args, &config),
        Commands::Paths(args) => run_paths(args, &config),
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

//! # Paths Subcommand
//!
//! Prints the output path each source unit maps to.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use zodgen_core::{Config, OutputPathResolver};

/// Arguments for the paths subcommand.
#[derive(Args, Debug)]
pub struct PathsArgs {
    /// Source unit paths.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Execute the paths subcommand.
pub fn run_paths(args: &PathsArgs, config: &Config) -> Result<u8> {
    let resolver = OutputPathResolver::new(config);
    for file in &args.files {
        println!("{}", resolver.resolve(file).display());
    }
    Ok(0)
}

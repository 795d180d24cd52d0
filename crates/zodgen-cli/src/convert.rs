//! # Convert Subcommand
//!
//! Compiles one source unit and prints the module, or writes it to its
//! mapped output path with `--write`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use zodgen_core::{Config, OutputPathResolver};
use zodgen_extract::SourceUnit;
use zodgen_schema::SchemaCompiler;
use zodgen_sync::{find_files, write_if_changed, WriteOutcome};

use crate::settings::FrontEndArgs;

/// Arguments for the convert subcommand.
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Source unit to compile.
    pub file: PathBuf,

    /// Write to the mapped output path instead of standard output.
    #[arg(long)]
    pub write: bool,

    #[command(flatten)]
    pub front_end: FrontEndArgs,
}

/// Execute the convert subcommand.
pub fn run_convert(args: &ConvertArgs, config: &Config) -> Result<u8> {
    let front_end = args.front_end.front_end()?;
    let mut sources = find_files(&config.watch_root, &config.source_extension);
    if !sources.contains(&args.file) {
        sources.push(args.file.clone());
    }
    let extractor = front_end.extractor(&sources);

    let unit = SourceUnit::read(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let compiled = SchemaCompiler::new(extractor.as_ref(), config.unknown_policy)
        .compile_unit(&unit)
        .with_context(|| format!("failed to compile {}", args.file.display()))?;

    let Some(compiled) = compiled else {
        eprintln!("{}: no records or enums", args.file.display());
        return Ok(0);
    };

    if !args.write {
        print!("{}", compiled.text);
        return Ok(0);
    }

    let output = OutputPathResolver::new(config).resolve(&args.file);
    let outcome = write_if_changed(&output, &compiled.text)?;
    let verb = match outcome {
        WriteOutcome::Generated => "generated",
        WriteOutcome::Updated => "updated",
        WriteOutcome::Unchanged => "unchanged",
    };
    println!("{verb}: {}", output.display());
    Ok(0)
}

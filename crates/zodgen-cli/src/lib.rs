//! # zodgen-cli: Command-Line Interface
//!
//! ## Subcommands
//!
//! - `convert`: compile one unit to standard output or its mapped path
//! - `sweep`: reconcile the whole output tree once
//! - `watch`: sweep, then apply source changes until interrupted
//! - `paths`: print where units map under the output root
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; compilation and reconciliation live in
//!   the library crates.
//! - Handlers return `anyhow::Result<u8>`; the `u8` is the process exit
//!   code.

pub mod convert;
pub mod paths;
pub mod settings;
pub mod sweep;
pub mod watch;

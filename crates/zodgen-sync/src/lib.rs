//! # zodgen-sync: Output Tree Reconciliation
//!
//! Drives [`zodgen_schema::SchemaCompiler`] over a whole source tree and
//! keeps the generated tree consistent with it.
//!
//! ## Components
//!
//! - [`SyncCoordinator`]: sweep and react batches under one lock.
//! - [`PollWatcher`]: turns filesystem polling into [`ChangeBatch`]es.
//! - [`write_if_changed`] / [`remove_output`]: the only code that touches
//!   generated files.
//!
//! ## Crate Policy
//!
//! - A failure on one file is logged and reported, never propagated out of
//!   a batch.
//! - Files are processed in sorted path order.
//! - No `unwrap()` outside tests.

pub mod coordinator;
pub mod error;
pub mod output;
pub mod walk;
pub mod watcher;

pub use coordinator::{FrontEnd, SyncCoordinator, SyncReport, SyncState};
pub use error::SyncError;
pub use output::{remove_output, write_if_changed, WriteOutcome};
pub use walk::find_files;
pub use watcher::{ChangeBatch, PollWatcher};

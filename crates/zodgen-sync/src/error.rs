//! Error types for synchronisation.

use std::path::PathBuf;

use thiserror::Error;
use zodgen_schema::CodegenError;

/// Failure to bring one output file in line with its source unit.
///
/// Batches catch these per file; they never abort a sweep or reaction.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The unit could not be compiled.
    #[error("failed to compile {}: {source}", path.display())]
    Compile {
        /// Source unit path.
        path: PathBuf,
        /// Underlying compilation error.
        #[source]
        source: CodegenError,
    },

    /// The output directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Output path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An orphaned or stale output could not be removed.
    #[error("failed to remove {}: {source}", path.display())]
    Remove {
        /// Output path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

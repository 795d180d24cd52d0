//! # Error Types

use thiserror::Error;
use zodgen_core::QualifiedName;
use zodgen_extract::ExtractError;

/// Error while compiling one unit to a schema module.
#[derive(Error, Debug)]
pub enum CodegenError {
    /// Extraction or reference resolution failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// Two distinct declarations would be emitted under one name.
    #[error("generated name {identifier} is derived from both {first} and {second}")]
    IdentifierCollision {
        /// The shared name stem.
        identifier: String,
        /// Declaration that claimed the identifier first.
        first: QualifiedName,
        /// Declaration that collided with it.
        second: QualifiedName,
    },
}

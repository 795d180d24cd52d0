//! # Error Types
//!
//! Errors owned by the core crate. Extraction, code generation, and sync
//! errors live in their own crates and wrap these where needed.

use std::path::PathBuf;

use thiserror::Error;

/// Error while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML or has unknown keys.
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path that was being parsed.
        path: PathBuf,
        /// Underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override carried an unusable value.
    #[error("invalid value {value:?} for {variable}: expected one of {expected}")]
    InvalidOverride {
        /// Environment variable name.
        variable: &'static str,
        /// Value that was rejected.
        value: String,
        /// Accepted values.
        expected: &'static str,
    },
}

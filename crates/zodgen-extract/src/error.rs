//! # Error Types
//!
//! A [`ParseError`] makes a whole source unit fail; an [`ExtractError`] is
//! what the extractors return to the translator and sync layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::token::Span;

/// Syntax error in a source unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    /// What went wrong.
    pub message: String,
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl ParseError {
    /// Error located at `span`.
    pub fn at(span: Span, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: span.line,
            column: span.column,
        }
    }
}

/// Error while extracting declarations from a source unit.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// The source unit could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The source unit has a syntax error.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path of the unit.
        path: PathBuf,
        /// Location and description.
        #[source]
        source: ParseError,
    },

    /// The reflector does not know a referenced type.
    #[error("type '{name}' is not known to the reflector")]
    Unresolved {
        /// Qualified name that was looked up.
        name: String,
    },

    /// The reflector knows the primary declaration but it is neither a
    /// struct nor an enum.
    #[error("'{name}' is neither a struct nor an enum")]
    NotADeclaration {
        /// Qualified name that was looked up.
        name: String,
    },

    /// A reflection registry file could not be read.
    #[error("failed to read reflection registry {path}: {source}")]
    RegistryRead {
        /// Registry path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A reflection registry is not valid JSON of the expected shape.
    #[error("invalid reflection registry {path}: {source}")]
    RegistryParse {
        /// Registry path.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

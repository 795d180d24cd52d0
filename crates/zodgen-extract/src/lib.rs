//! # zodgen-extract: Declaration Extractors
//!
//! Produces the ordered list of [`Declaration`]s for one source unit. Two
//! front ends implement [`Extractor`]:
//!
//! - [`StaticExtractor`] parses the unit's text and classifies field types
//!   from the syntax tree.
//! - [`ReflectiveExtractor`] reads only the primary declaration's name from
//!   the text and takes everything else from a [`TypeReflector`].
//!
//! Both classify into the same [`zodgen_core::TypeExpr`] shapes, so the
//! translator cannot tell which one ran.
//!
//! ## Name Resolution
//!
//! References the unit does not declare go through
//! [`Extractor::resolve`]. The static front end delegates to a
//! [`DeclarationResolver`] such as [`ProjectIndex`]; the reflective front
//! end asks its reflector.
//!
//! ## Crate Policy
//!
//! - A syntax error fails the unit ([`ExtractError::Parse`]); a field type
//!   that cannot be read becomes `Unknown` instead.
//! - No `unwrap()` outside tests.

pub mod error;
pub mod expr;
pub mod index;
pub mod lexer;
pub mod parser;
pub mod reflect;
pub mod static_form;
pub mod syntax;
pub mod token;

use std::path::{Path, PathBuf};

use zodgen_core::{Declaration, QualifiedName};

pub use error::{ExtractError, ParseError};
pub use index::ProjectIndex;
pub use reflect::{JsonRegistry, PropMeta, ReflectedType, ReflectiveExtractor, TypeMeta, TypeReflector};
pub use static_form::StaticExtractor;

/// One source file: its path and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// Path the unit was read from.
    pub path: PathBuf,
    /// Full source text.
    pub text: String,
}

impl SourceUnit {
    /// A unit from in-memory text.
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            text: text.into(),
        }
    }

    /// Read a unit from disk.
    pub fn read(path: &Path) -> Result<Self, ExtractError> {
        let text = std::fs::read_to_string(path).map_err(|source| ExtractError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, text))
    }
}

/// Resolves a reference written inside `scope` to a declaration defined
/// outside the unit being translated.
pub trait DeclarationResolver: Send + Sync {
    /// `Ok(None)` when nothing by that name is a record or enum.
    fn resolve(
        &self,
        scope: &QualifiedName,
        reference: &str,
    ) -> Result<Option<Declaration>, ExtractError>;
}

/// A declaration front end.
pub trait Extractor: Send + Sync {
    /// Root declarations of `unit`, in the order they should be emitted.
    /// A unit without records or enums yields an empty list.
    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Declaration>, ExtractError>;

    /// Resolve a reference the unit does not declare. `Ok(None)` degrades
    /// the reference to an unknown schema; `Err` fails the unit.
    fn resolve(
        &self,
        scope: &QualifiedName,
        reference: &str,
    ) -> Result<Option<Declaration>, ExtractError> {
        let _ = (scope, reference);
        Ok(None)
    }

    /// Short front-end name for logs.
    fn name(&self) -> &'static str;
}

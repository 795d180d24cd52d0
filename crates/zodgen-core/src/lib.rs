//! # zodgen-core: Shared Data Model
//!
//! Defines the types every other zodgen crate speaks: the declarations
//! extracted from a source unit, the recursive type expressions of their
//! fields, generator configuration, and the source-to-output path mapping.
//!
//! ## Key Types
//!
//! - [`Declaration`]: a Record (ordered [`Field`]s) or an Enum (ordered
//!   variant names), named by a [`QualifiedName`].
//! - [`TypeExpr`]: `Primitive`, `Optional`, `Array`, `Map`, `Union`,
//!   `Reference`, `Unknown`.
//! - [`Config`]: watch root, output root, extensions, unknown-shape policy.
//! - [`OutputPathResolver`]: maps `watch_root/a/b.rb` to `output_root/a/b.ts`.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `zodgen-*` crates (this is the leaf of the DAG).
//! - No IO beyond reading a config file.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod declaration;
pub mod error;
pub mod identity;
pub mod paths;

pub use config::{Config, UnknownPolicy};
pub use declaration::{
    normalize_variant, Declaration, DeclarationBody, DeclarationKind, Field, Primitive, TypeExpr,
    FALSE_SENTINEL, NIL_SENTINEL, TRUE_SENTINEL,
};
pub use error::ConfigError;
pub use identity::QualifiedName;
pub use paths::OutputPathResolver;

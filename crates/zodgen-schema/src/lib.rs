//! # zodgen-schema: Zod Schema Generation
//!
//! Translates the declarations of one source unit into a TypeScript module
//! of Zod schemas.
//!
//! ## Pipeline
//!
//! 1. [`SchemaCompiler::compile_unit`] asks the [`zodgen_extract::Extractor`]
//!    for the unit's root declarations.
//! 2. A worklist translates each declaration body with [`Translator`].
//!    References the body makes are resolved, inserted into the
//!    [`DiscoveredSet`] and queued.
//! 3. [`emit`] walks the roots depth-first and writes dependencies before
//!    the declarations that use them.
//!
//! ## Crate Policy
//!
//! - Output depends only on the input: the discovered set and every list
//!   fed to the emitter are insertion-ordered.
//! - Unsupported shapes become `z.unknown()`; only extractor failures and
//!   identifier collisions fail a unit.
//! - No `unwrap()` outside tests.

pub mod codegen;
pub mod discovered;
pub mod emit;
pub mod error;
pub mod translate;

pub use codegen::SchemaCompiler;
pub use discovered::DiscoveredSet;
pub use emit::{emit, CompiledUnit, BANNER, IMPORT};
pub use error::CodegenError;
pub use translate::{Site, Translation, Translator, UNKNOWN_SCHEMA};

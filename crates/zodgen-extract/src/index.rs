//! # Project Index
//!
//! Name resolution for the static front end: every source unit under the
//! watch root is extracted once and its declarations are indexed by
//! qualified name. A reference that a unit does not declare itself is
//! looked up here with the same innermost-scope-first rule used inside the
//! unit.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};
use zodgen_core::{Declaration, QualifiedName};

use crate::error::ExtractError;
use crate::static_form::StaticExtractor;
use crate::{DeclarationResolver, Extractor, SourceUnit};

/// Declarations of a whole project, keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct ProjectIndex {
    declarations: HashMap<QualifiedName, Declaration>,
}

impl ProjectIndex {
    /// An empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Index every readable, parseable unit among `paths`. Units that fail
    /// are logged and left out; they fail again, with a proper report, when
    /// they are themselves translated.
    pub fn build<P: AsRef<Path>>(paths: &[P]) -> Self {
        let mut index = Self::new();
        for path in paths {
            let path = path.as_ref();
            let result = SourceUnit::read(path).and_then(|unit| index.add_unit(&unit));
            if let Err(err) = result {
                warn!(path = %path.display(), error = %err, "skipping unit in project index");
            }
        }
        debug!(declarations = index.len(), "built project index");
        index
    }

    /// Extract `unit` statically and index its declarations. Returns how
    /// many were added.
    pub fn add_unit(&mut self, unit: &SourceUnit) -> Result<usize, ExtractError> {
        let declarations = StaticExtractor::new().extract(unit)?;
        let count = declarations.len();
        for declaration in declarations {
            self.insert(declaration);
        }
        Ok(count)
    }

    /// Index one declaration, replacing any earlier one of the same name.
    pub fn insert(&mut self, declaration: Declaration) {
        if let Some(previous) = self.declarations.insert(declaration.name.clone(), declaration) {
            debug!(declaration = %previous.name, "declaration indexed twice; keeping the later one");
        }
    }

    /// Look up a declaration by exact qualified name.
    pub fn get(&self, name: &QualifiedName) -> Option<&Declaration> {
        self.declarations.get(name)
    }

    /// Number of indexed declarations.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl DeclarationResolver for ProjectIndex {
    fn resolve(
        &self,
        scope: &QualifiedName,
        reference: &str,
    ) -> Result<Option<Declaration>, ExtractError> {
        Ok(scope
            .lexical_candidates(reference)
            .iter()
            .find_map(|candidate| self.declarations.get(candidate))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn resolves_innermost_scope_first() {
        let mut index = ProjectIndex::new();
        index.insert(Declaration::record("Address", vec![]));
        index.insert(Declaration::record("Api::Address", vec![]));

        let scope = QualifiedName::new("Api::User");
        let found = index.resolve(&scope, "Address").unwrap().unwrap();
        assert_eq!(found.name.as_str(), "Api::Address");

        let anchored = index.resolve(&scope, "::Address").unwrap().unwrap();
        assert_eq!(anchored.name.as_str(), "Address");

        assert!(index.resolve(&scope, "Missing").unwrap().is_none());
    }

    #[test]
    fn build_reads_files_and_skips_broken_ones() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("address.rb");
        let broken = dir.path().join("broken.rb");
        std::fs::write(
            &good,
            "module Shared\n  class Address < T::Struct\n    const :city, String\n  end\nend\n",
        )
        .unwrap();
        std::fs::write(&broken, "class Broken < T::Struct\n").unwrap();

        let index = ProjectIndex::build(&[good, broken, dir.path().join("missing.rb")]);
        assert_eq!(index.len(), 1);
        assert!(index.get(&QualifiedName::new("Shared::Address")).is_some());
    }

    #[test]
    fn static_extractor_consults_the_index() {
        let mut index = ProjectIndex::new();
        index.insert(Declaration::enumeration("Color", &["red"]));
        let extractor = StaticExtractor::with_resolver(Arc::new(index));
        let found = extractor
            .resolve(&QualifiedName::new("Shirt"), "Color")
            .unwrap();
        assert!(found.is_some());
    }
}

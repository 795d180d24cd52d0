//! The discovered set: declarations known to need emission.
//!
//! Insertion order is kept alongside a by-name map so every iteration is
//! deterministic. Each entry gains its translated body and the names it
//! depends on once the worklist reaches it.

use std::collections::HashMap;

use zodgen_core::{Declaration, QualifiedName};

use crate::error::CodegenError;

/// A discovered declaration and, once translated, its schema body.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The declaration.
    pub declaration: Declaration,
    /// Schema expression for the declaration, filled in after translation.
    pub body: Option<String>,
    /// Declarations referenced by the body, in first-reference order.
    pub dependencies: Vec<QualifiedName>,
}

/// Insertion-ordered set of declarations keyed by qualified name.
#[derive(Debug, Clone, Default)]
pub struct DiscoveredSet {
    order: Vec<QualifiedName>,
    entries: HashMap<QualifiedName, Entry>,
    identifiers: HashMap<String, QualifiedName>,
}

impl DiscoveredSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `declaration` if its name is new. Returns whether it was added.
    ///
    /// Fails when a different declaration already has the same stem, since
    /// both its schema identifier and its type alias would clash.
    pub fn insert(&mut self, declaration: Declaration) -> Result<bool, CodegenError> {
        if self.entries.contains_key(&declaration.name) {
            return Ok(false);
        }
        let identifier = declaration.type_alias();
        if let Some(owner) = self.identifiers.get(&identifier) {
            return Err(CodegenError::IdentifierCollision {
                identifier,
                first: owner.clone(),
                second: declaration.name,
            });
        }

        self.identifiers.insert(identifier, declaration.name.clone());
        self.order.push(declaration.name.clone());
        self.entries.insert(
            declaration.name.clone(),
            Entry {
                declaration,
                body: None,
                dependencies: Vec::new(),
            },
        );
        Ok(true)
    }

    /// Whether `name` has been discovered.
    pub fn contains(&self, name: &QualifiedName) -> bool {
        self.entries.contains_key(name)
    }

    /// The entry for `name`.
    pub fn get(&self, name: &QualifiedName) -> Option<&Entry> {
        self.entries.get(name)
    }

    /// The first discovered declaration among `reference`'s lexical
    /// candidates inside `scope`.
    pub fn find_lexical(&self, scope: &QualifiedName, reference: &str) -> Option<&Declaration> {
        scope
            .lexical_candidates(reference)
            .iter()
            .find_map(|candidate| self.entries.get(candidate))
            .map(|entry| &entry.declaration)
    }

    /// Record the translation of `name`.
    pub fn complete(&mut self, name: &QualifiedName, body: String, dependencies: Vec<QualifiedName>) {
        if let Some(entry) = self.entries.get_mut(name) {
            entry.body = Some(body);
            entry.dependencies = dependencies;
        }
    }

    /// Names in discovery order.
    pub fn names(&self) -> &[QualifiedName] {
        &self.order
    }

    /// Number of discovered declarations.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing has been discovered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order_and_ignores_repeats() {
        let mut set = DiscoveredSet::new();
        assert!(set.insert(Declaration::record("B", vec![])).unwrap());
        assert!(set.insert(Declaration::record("A", vec![])).unwrap());
        assert!(!set.insert(Declaration::record("B", vec![])).unwrap());
        let names: Vec<&str> = set.names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn identifier_collision_is_an_error() {
        let mut set = DiscoveredSet::new();
        set.insert(Declaration::record("Api::User", vec![])).unwrap();
        let err = set.insert(Declaration::record("ApiUser", vec![])).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::IdentifierCollision { ref identifier, .. } if identifier == "ApiUser"
        ));
    }

    #[test]
    fn record_and_enum_with_one_stem_collide_on_the_alias() {
        let mut set = DiscoveredSet::new();
        set.insert(Declaration::record("Api::Status", vec![])).unwrap();
        let err = set
            .insert(Declaration::enumeration("ApiStatus", &["A"]))
            .unwrap_err();
        assert!(matches!(
            err,
            CodegenError::IdentifierCollision { ref identifier, .. } if identifier == "ApiStatus"
        ));
    }

    #[test]
    fn lexical_lookup_prefers_inner_scope() {
        let mut set = DiscoveredSet::new();
        set.insert(Declaration::record("Result", vec![])).unwrap();
        set.insert(Declaration::record("Payload::Result", vec![])).unwrap();
        let found = set
            .find_lexical(&QualifiedName::new("Payload"), "Result")
            .unwrap();
        assert_eq!(found.name.as_str(), "Payload::Result");
    }
}

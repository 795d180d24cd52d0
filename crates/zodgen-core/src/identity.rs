//! # Qualified Declaration Names
//!
//! Newtype wrapper for `::`-separated declaration names such as
//! `Api::V1::ComplexNested::Address`. Keeping the name in a newtype means a
//! raw field name can never be passed where a declaration name is expected,
//! and every identifier derived for the generated TypeScript flows through
//! one place.

use serde::{Deserialize, Serialize};

/// Separator between namespace segments in source-language constant paths.
pub const NAMESPACE_SEPARATOR: &str = "::";

/// Fully-qualified name of a Record or Enum declaration.
///
/// Stored without a leading `::`. Ordering is lexical on the joined string,
/// which gives deterministic iteration where a sorted view is needed.
#[derive(
    Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Build a qualified name from a constant path, stripping any leading
    /// `::` (top-level anchor) and surrounding whitespace.
    pub fn new(path: impl AsRef<str>) -> Self {
        let trimmed = path.as_ref().trim();
        let trimmed = trimmed.strip_prefix(NAMESPACE_SEPARATOR).unwrap_or(trimmed);
        Self(trimmed.to_string())
    }

    /// Whether this is the empty (top-level) scope.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Build a qualified name by joining namespace segments.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let joined = segments
            .iter()
            .map(AsRef::as_ref)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(NAMESPACE_SEPARATOR);
        Self(joined)
    }

    /// The joined path, e.g. `Payload::Result`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over namespace segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(NAMESPACE_SEPARATOR).filter(|s| !s.is_empty())
    }

    /// The innermost segment (the declaration's own short name).
    pub fn short_name(&self) -> &str {
        self.segments().last().unwrap_or("")
    }

    /// Append a (possibly multi-segment) relative path to this name.
    pub fn join(&self, relative: &str) -> Self {
        let relative = QualifiedName::new(relative);
        if self.0.is_empty() {
            relative
        } else if relative.0.is_empty() {
            self.clone()
        } else {
            Self(format!("{}{NAMESPACE_SEPARATOR}{}", self.0, relative.0))
        }
    }

    /// The enclosing namespace, or `None` at top level.
    pub fn parent(&self) -> Option<Self> {
        self.0
            .rfind(NAMESPACE_SEPARATOR)
            .map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Concatenation of all segments with separators stripped:
    /// `Api::V1::User` becomes `ApiV1User`.
    pub fn stem(&self) -> String {
        self.segments().collect()
    }

    /// Candidate resolutions for `reference` written inside this scope,
    /// innermost scope first.
    ///
    /// A reference `X` inside `A::B` yields `A::B::X`, `A::X`, `X`. An
    /// explicitly anchored reference (`::X`) yields only `X`.
    pub fn lexical_candidates(&self, reference: &str) -> Vec<QualifiedName> {
        let reference = reference.trim();
        if reference.starts_with(NAMESPACE_SEPARATOR) {
            return vec![QualifiedName::new(reference)];
        }
        let mut candidates = Vec::new();
        let mut scope = Some(self.clone());
        while let Some(current) = scope {
            if !current.0.is_empty() {
                candidates.push(current.join(reference));
            }
            scope = current.parent();
        }
        candidates.push(QualifiedName::new(reference));
        candidates
    }
}

impl std::fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_anchor_is_stripped() {
        assert_eq!(QualifiedName::new("::Foo::Bar").as_str(), "Foo::Bar");
    }

    #[test]
    fn stem_concatenates_segments() {
        let name = QualifiedName::new("Api::V1::ComplexNested::Address");
        assert_eq!(name.stem(), "ApiV1ComplexNestedAddress");
        assert_eq!(name.short_name(), "Address");
    }

    #[test]
    fn parent_walks_outward() {
        let name = QualifiedName::new("A::B::C");
        assert_eq!(name.parent(), Some(QualifiedName::new("A::B")));
        assert_eq!(QualifiedName::new("A").parent(), None);
    }

    #[test]
    fn from_segments_skips_empty() {
        let name = QualifiedName::from_segments(&["Api", "", "User"]);
        assert_eq!(name.as_str(), "Api::User");
    }

    #[test]
    fn lexical_candidates_innermost_first() {
        let scope = QualifiedName::new("A::B");
        let candidates: Vec<String> = scope
            .lexical_candidates("X")
            .into_iter()
            .map(|c| c.to_string())
            .collect();
        assert_eq!(candidates, vec!["A::B::X", "A::X", "X"]);
    }

    #[test]
    fn anchored_reference_has_single_candidate() {
        let scope = QualifiedName::new("A::B");
        assert_eq!(
            scope.lexical_candidates("::X"),
            vec![QualifiedName::new("X")]
        );
    }

    #[test]
    fn join_on_empty_scope() {
        let empty = QualifiedName::new("");
        assert_eq!(empty.join("Foo::Bar").as_str(), "Foo::Bar");
    }
}

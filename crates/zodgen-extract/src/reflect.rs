//! # Reflective Extraction
//!
//! The reflective front end reads source text only to find the qualified
//! name of the unit's first struct or enum. Everything else comes from a
//! [`TypeReflector`], the host runtime's view of already-resolved types.
//! Referenced declarations are not pre-scanned; the translator asks for
//! them through [`Extractor::resolve`] as it meets them.
//!
//! ## Registry format
//!
//! [`JsonRegistry`] reads a metadata dump keyed by qualified name:
//!
//! ```json
//! {
//!   "types": {
//!     "Payload": {
//!       "kind": "struct",
//!       "props": [
//!         { "name": "results",
//!           "type": { "kind": "typed_array",
//!                     "element": { "kind": "simple", "class": "Payload::Result" } } },
//!         { "name": "note", "type": { "kind": "simple", "class": "String" }, "nilable": true }
//!       ]
//!     },
//!     "Payload::Result": { "kind": "struct", "props": [] },
//!     "Color": { "kind": "enum", "values": ["red", "green"] },
//!     "Time": { "kind": "class" }
//!   }
//! }
//! ```
//!
//! ## Failure modes
//!
//! A name the reflector does not know is an error for the whole unit. A
//! known class that is neither a struct nor an enum is an unknown-schema
//! field when referenced, and an error when it is the unit's primary
//! declaration.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use zodgen_core::{Declaration, Field, Primitive, QualifiedName, TypeExpr};

use crate::error::ExtractError;
use crate::parser::parse;
use crate::static_form::discover;
use crate::{Extractor, SourceUnit};

/// Runtime type metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeMeta {
    /// A plain class such as `String` or `Payload::Result`.
    Simple {
        /// Qualified class name.
        class: String,
    },
    /// `T::Array[element]`.
    TypedArray {
        /// Element type.
        element: Box<TypeMeta>,
    },
    /// `T::Hash[key, value]`.
    TypedHash {
        /// Key type.
        key: Box<TypeMeta>,
        /// Value type.
        value: Box<TypeMeta>,
    },
    /// Two-member union; `T::Boolean` and `T.nilable(X)` take this shape.
    SimplePairUnion {
        /// First member.
        first: Box<TypeMeta>,
        /// Second member.
        second: Box<TypeMeta>,
    },
    /// Union of any arity.
    Union {
        /// Members in declared order.
        types: Vec<TypeMeta>,
    },
    /// `T.untyped`.
    Untyped,
    /// Anything else the runtime can describe (`T.class_of`, intersections).
    Other {
        /// Free-form description, for diagnostics only.
        #[serde(default)]
        description: String,
    },
}

impl TypeMeta {
    /// Classify into the shared type model.
    pub fn to_type_expr(&self) -> TypeExpr {
        match self {
            Self::Simple { class } => {
                let class = class.trim_start_matches("::");
                match Primitive::from_class_name(class) {
                    Some(primitive) => TypeExpr::Primitive(primitive),
                    None if class == "T::Boolean" => TypeExpr::Primitive(Primitive::Boolean),
                    None => TypeExpr::Reference(format!("::{class}")),
                }
            }
            Self::TypedArray { element } => TypeExpr::array_of(element.to_type_expr()),
            Self::TypedHash { key, value } => TypeExpr::map_of(key.to_type_expr(), value.to_type_expr()),
            Self::SimplePairUnion { first, second } => {
                TypeExpr::union_of(vec![first.to_type_expr(), second.to_type_expr()])
            }
            Self::Union { types } => TypeExpr::union_of(types.iter().map(Self::to_type_expr).collect()),
            Self::Untyped | Self::Other { .. } => TypeExpr::Unknown,
        }
    }
}

/// One prop of a reflected struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropMeta {
    /// Prop name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeMeta,
    /// Whether the runtime marks the prop nilable independently of its type.
    #[serde(default)]
    pub nilable: bool,
}

/// What the reflector knows about a named type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReflectedType {
    /// A `T::Struct` with its props in declaration order.
    Struct {
        /// Props in order.
        props: Vec<PropMeta>,
    },
    /// A `T::Enum` with its serialized values in declaration order.
    Enum {
        /// Variant names.
        values: Vec<String>,
    },
    /// A class that is neither.
    Class,
}

impl ReflectedType {
    /// The declaration for `name`, or `None` for a plain class.
    pub fn to_declaration(&self, name: QualifiedName) -> Option<Declaration> {
        match self {
            Self::Struct { props } => {
                let fields = props
                    .iter()
                    .map(|prop| {
                        let ty = prop.ty.to_type_expr();
                        let ty = match ty {
                            TypeExpr::Optional(_) => ty,
                            _ if prop.nilable => TypeExpr::optional(ty),
                            _ => ty,
                        };
                        Field::new(prop.name.clone(), ty)
                    })
                    .collect();
                Some(Declaration::record(name, fields))
            }
            Self::Enum { values } => Some(Declaration::enumeration(name, values)),
            Self::Class => None,
        }
    }
}

/// The host runtime's type-reflection facility.
pub trait TypeReflector: Send + Sync {
    /// Metadata for `name`, or `None` if the runtime has no such constant.
    fn reflect(&self, name: &QualifiedName) -> Option<ReflectedType>;
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RegistryFile {
    types: BTreeMap<String, ReflectedType>,
}

/// A [`TypeReflector`] backed by a JSON metadata dump.
#[derive(Debug, Clone, Default)]
pub struct JsonRegistry {
    types: HashMap<QualifiedName, ReflectedType>,
}

impl JsonRegistry {
    /// Parse a registry document; `origin` is used in error messages.
    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self, ExtractError> {
        let file: RegistryFile =
            serde_json::from_str(json).map_err(|source| ExtractError::RegistryParse {
                path: origin.to_path_buf(),
                source,
            })?;
        let types = file
            .types
            .into_iter()
            .map(|(name, ty)| (QualifiedName::new(name), ty))
            .collect();
        Ok(Self { types })
    }

    /// Read and parse a registry file.
    pub fn from_file(path: &Path) -> Result<Self, ExtractError> {
        let json = std::fs::read_to_string(path).map_err(|source| ExtractError::RegistryRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json, path)
    }

    /// Register or replace one type.
    pub fn insert(&mut self, name: impl Into<QualifiedName>, ty: ReflectedType) {
        self.types.insert(name.into(), ty);
    }

    /// Number of known types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether no types are known.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeReflector for JsonRegistry {
    fn reflect(&self, name: &QualifiedName) -> Option<ReflectedType> {
        self.types.get(name).cloned()
    }
}

/// Extractor that reads declarations through a [`TypeReflector`].
#[derive(Clone)]
pub struct ReflectiveExtractor {
    reflector: Arc<dyn TypeReflector>,
}

impl ReflectiveExtractor {
    /// Extractor over `reflector`.
    pub fn new(reflector: Arc<dyn TypeReflector>) -> Self {
        Self { reflector }
    }

    /// The qualified name of the first struct or enum in `source`, in
    /// breadth-first order.
    pub fn primary_name(source: &str) -> Result<Option<QualifiedName>, crate::ParseError> {
        let nodes = parse(source)?;
        Ok(discover(&nodes)
            .classes
            .into_iter()
            .next()
            .map(|class| class.name))
    }
}

impl std::fmt::Debug for ReflectiveExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectiveExtractor").finish_non_exhaustive()
    }
}

impl Extractor for ReflectiveExtractor {
    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Declaration>, ExtractError> {
        let primary = Self::primary_name(&unit.text).map_err(|source| ExtractError::Parse {
            path: unit.path.clone(),
            source,
        })?;
        let Some(name) = primary else {
            debug!(path = %unit.path.display(), "no struct or enum in unit");
            return Ok(Vec::new());
        };

        let reflected = self
            .reflector
            .reflect(&name)
            .ok_or_else(|| ExtractError::Unresolved {
                name: name.to_string(),
            })?;
        let declaration = reflected
            .to_declaration(name.clone())
            .ok_or_else(|| ExtractError::NotADeclaration {
                name: name.to_string(),
            })?;
        debug!(path = %unit.path.display(), declaration = %name, "reflected primary declaration");
        Ok(vec![declaration])
    }

    fn resolve(
        &self,
        scope: &QualifiedName,
        reference: &str,
    ) -> Result<Option<Declaration>, ExtractError> {
        for candidate in scope.lexical_candidates(reference) {
            if let Some(reflected) = self.reflector.reflect(&candidate) {
                return Ok(reflected.to_declaration(candidate));
            }
        }
        Err(ExtractError::Unresolved {
            name: reference.trim_start_matches("::").to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "reflective"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::DeclarationBody;

    const REGISTRY: &str = r#"{
      "types": {
        "Payload": {
          "kind": "struct",
          "props": [
            { "name": "results",
              "type": { "kind": "typed_array",
                        "element": { "kind": "simple", "class": "Payload::Result" } } },
            { "name": "flag",
              "type": { "kind": "simple_pair_union",
                        "first": { "kind": "simple", "class": "TrueClass" },
                        "second": { "kind": "simple", "class": "FalseClass" } } },
            { "name": "note",
              "type": { "kind": "simple_pair_union",
                        "first": { "kind": "simple", "class": "String" },
                        "second": { "kind": "simple", "class": "NilClass" } } },
            { "name": "meta",
              "type": { "kind": "typed_hash",
                        "key": { "kind": "simple", "class": "String" },
                        "value": { "kind": "untyped" } } },
            { "name": "count", "type": { "kind": "simple", "class": "Integer" }, "nilable": true }
          ]
        },
        "Payload::Result": { "kind": "struct", "props": [] },
        "Color": { "kind": "enum", "values": ["red", "Green"] },
        "Time": { "kind": "class" }
      }
    }"#;

    fn registry() -> Arc<JsonRegistry> {
        Arc::new(JsonRegistry::from_json_str(REGISTRY, Path::new("registry.json")).unwrap())
    }

    #[test]
    fn metadata_classifies_like_source() {
        let decl = ReflectiveExtractor::new(registry())
            .extract(&SourceUnit::new(
                "payload.rb",
                "class Payload < T::Struct\n  class Result < T::Struct\n  end\nend\n",
            ))
            .unwrap();
        assert_eq!(decl.len(), 1);
        let DeclarationBody::Record(fields) = &decl[0].body else {
            panic!("expected record");
        };
        let string = TypeExpr::Primitive(Primitive::String);
        assert_eq!(
            fields[0].ty,
            TypeExpr::array_of(TypeExpr::reference("::Payload::Result"))
        );
        assert!(TypeExpr::is_boolean_pair(match &fields[1].ty {
            TypeExpr::Union(members) => members,
            other => panic!("expected union, got {other:?}"),
        }));
        assert_eq!(fields[2].ty, TypeExpr::optional(string.clone()));
        assert_eq!(fields[3].ty, TypeExpr::map_of(string, TypeExpr::Unknown));
        assert_eq!(
            fields[4].ty,
            TypeExpr::optional(TypeExpr::Primitive(Primitive::Number))
        );
    }

    #[test]
    fn primary_name_is_module_qualified() {
        let name = ReflectiveExtractor::primary_name(
            "module Shop\n  class Color < T::Enum\n    enums do\n      Red = new\n    end\n  end\nend\n",
        )
        .unwrap();
        assert_eq!(name, Some(QualifiedName::new("Shop::Color")));
    }

    #[test]
    fn unit_without_declarations_is_empty() {
        let decls = ReflectiveExtractor::new(registry())
            .extract(&SourceUnit::new("plain.rb", "class Plain\nend\n"))
            .unwrap();
        assert!(decls.is_empty());
    }

    #[test]
    fn unknown_primary_is_an_error() {
        let err = ReflectiveExtractor::new(registry())
            .extract(&SourceUnit::new("ghost.rb", "class Ghost < T::Struct\nend\n"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::Unresolved { ref name } if name == "Ghost"));
    }

    #[test]
    fn resolve_returns_declarations_and_skips_plain_classes() {
        let extractor = ReflectiveExtractor::new(registry());
        let scope = QualifiedName::new("Payload");
        let color = extractor.resolve(&scope, "::Color").unwrap().unwrap();
        assert_eq!(
            color.body,
            DeclarationBody::Enum(vec!["RED".to_string(), "GREEN".to_string()])
        );
        assert_eq!(extractor.resolve(&scope, "::Time").unwrap(), None);
        assert!(extractor.resolve(&scope, "::Missing").is_err());
    }

    #[test]
    fn malformed_registry_is_rejected() {
        let err = JsonRegistry::from_json_str("{\"types\": {\"A\": {\"kind\": \"blob\"}}}", Path::new("r.json"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::RegistryParse { .. }));
    }
}

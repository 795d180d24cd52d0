//! # Type Expression Translation
//!
//! Maps a [`TypeExpr`] to a Zod expression and reports the declarations it
//! references. References resolve against the discovered set first (the
//! unit's own declarations plus anything pulled in so far), then through
//! the extractor. An unresolvable reference, like any shape without a
//! schema equivalent, becomes `z.unknown()`.
//!
//! | Shape | Output |
//! |---|---|
//! | `String` | `z.string()` |
//! | `Integer`, `Float`, `Numeric` | `z.number()` |
//! | `T::Boolean`, `TrueClass`/`FalseClass` pair | `z.boolean()` |
//! | `Optional(X)` | `X.nullable()` |
//! | `Array(X)` / `Array` | `z.array(X)` / `z.array(z.unknown())` |
//! | `Map(K, V)` / `Map` | `z.record(K, V)` / `z.record(z.unknown(), z.unknown())` |
//! | `Union(A, B, ...)` | `z.union([A, B, ...])` |
//! | `Reference(R)` | identifier of `R` |

use tracing::warn;
use zodgen_core::{
    Declaration, DeclarationBody, Primitive, QualifiedName, TypeExpr, UnknownPolicy,
    FALSE_SENTINEL, NIL_SENTINEL, TRUE_SENTINEL,
};
use zodgen_extract::Extractor;

use crate::discovered::DiscoveredSet;
use crate::error::CodegenError;

/// Zod expression for a value of unknown shape.
pub const UNKNOWN_SCHEMA: &str = "z.unknown()";

/// A translated expression and the declarations it references, in
/// first-reference order without repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Zod expression.
    pub code: String,
    /// Referenced declarations.
    pub dependencies: Vec<Declaration>,
}

/// Where a type expression sits, for diagnostics.
#[derive(Debug, Clone, Copy)]
pub struct Site<'a> {
    /// Declaration owning the field; also the lexical scope of references.
    pub scope: &'a QualifiedName,
    /// Field name.
    pub field: &'a str,
}

/// Translates type expressions for one compiled unit.
pub struct Translator<'a> {
    extractor: &'a dyn Extractor,
    policy: UnknownPolicy,
}

impl<'a> Translator<'a> {
    /// A translator resolving out-of-unit references through `extractor`.
    pub fn new(extractor: &'a dyn Extractor, policy: UnknownPolicy) -> Self {
        Self { extractor, policy }
    }

    /// Translate one type expression.
    pub fn translate(
        &self,
        expr: &TypeExpr,
        site: Site<'_>,
        known: &DiscoveredSet,
    ) -> Result<Translation, CodegenError> {
        let mut dependencies = Vec::new();
        let code = self.translate_into(expr, site, known, &mut dependencies)?;
        Ok(Translation { code, dependencies })
    }

    /// Schema expression for a whole declaration: `z.object({...})` or
    /// `z.enum([...])`.
    pub fn translate_declaration(
        &self,
        declaration: &Declaration,
        known: &DiscoveredSet,
    ) -> Result<Translation, CodegenError> {
        match &declaration.body {
            DeclarationBody::Enum(variants) => {
                let quoted: Vec<String> = variants.iter().map(|v| quote(v)).collect();
                Ok(Translation {
                    code: format!("z.enum([{}])", quoted.join(", ")),
                    dependencies: Vec::new(),
                })
            }
            DeclarationBody::Record(fields) => {
                let mut dependencies = Vec::new();
                let mut lines = Vec::with_capacity(fields.len());
                for field in fields {
                    let site = Site {
                        scope: &declaration.name,
                        field: &field.name,
                    };
                    let code = self.translate_into(&field.ty, site, known, &mut dependencies)?;
                    lines.push(format!("  {}: {}", property_key(&field.name), code));
                }
                let code = if lines.is_empty() {
                    "z.object({})".to_string()
                } else {
                    format!("z.object({{\n{}\n}})", lines.join(",\n"))
                };
                Ok(Translation { code, dependencies })
            }
        }
    }

    fn translate_into(
        &self,
        expr: &TypeExpr,
        site: Site<'_>,
        known: &DiscoveredSet,
        dependencies: &mut Vec<Declaration>,
    ) -> Result<String, CodegenError> {
        let code = match expr {
            TypeExpr::Primitive(Primitive::String) => "z.string()".to_string(),
            TypeExpr::Primitive(Primitive::Number) => "z.number()".to_string(),
            TypeExpr::Primitive(Primitive::Boolean) => "z.boolean()".to_string(),
            TypeExpr::Optional(inner) => {
                format!("{}.nullable()", self.translate_into(inner, site, known, dependencies)?)
            }
            TypeExpr::Array(Some(element)) => {
                format!("z.array({})", self.translate_into(element, site, known, dependencies)?)
            }
            TypeExpr::Array(None) => format!("z.array({UNKNOWN_SCHEMA})"),
            TypeExpr::Map(Some(pair)) => {
                let (key, value) = &**pair;
                let key = self.translate_into(key, site, known, dependencies)?;
                let value = self.translate_into(value, site, known, dependencies)?;
                format!("z.record({key}, {value})")
            }
            TypeExpr::Map(None) => format!("z.record({UNKNOWN_SCHEMA}, {UNKNOWN_SCHEMA})"),
            TypeExpr::Union(members) if TypeExpr::is_boolean_pair(members) => {
                "z.boolean()".to_string()
            }
            TypeExpr::Union(members) => {
                let mut parts = Vec::with_capacity(members.len());
                for member in members {
                    parts.push(self.translate_into(member, site, known, dependencies)?);
                }
                format!("z.union([{}])", parts.join(", "))
            }
            TypeExpr::Reference(reference) => match self.resolve(reference, site, known)? {
                Some(declaration) => {
                    let identifier = declaration.schema_identifier();
                    if !dependencies.iter().any(|d| d.name == declaration.name) {
                        dependencies.push(declaration);
                    }
                    identifier
                }
                None => self.unknown(site, reference),
            },
            TypeExpr::Unknown => self.unknown(site, "unsupported type"),
        };
        Ok(code)
    }

    fn resolve(
        &self,
        reference: &str,
        site: Site<'_>,
        known: &DiscoveredSet,
    ) -> Result<Option<Declaration>, CodegenError> {
        let bare = reference.trim_start_matches("::");
        if [TRUE_SENTINEL, FALSE_SENTINEL, NIL_SENTINEL].contains(&bare) {
            return Ok(None);
        }
        if let Some(found) = known.find_lexical(site.scope, reference) {
            return Ok(Some(found.clone()));
        }
        Ok(self.extractor.resolve(site.scope, reference)?)
    }

    fn unknown(&self, site: Site<'_>, detail: &str) -> String {
        if self.policy == UnknownPolicy::Warn {
            warn!(
                declaration = %site.scope,
                field = site.field,
                detail,
                "no schema equivalent; emitting {UNKNOWN_SCHEMA}"
            );
        }
        UNKNOWN_SCHEMA.to_string()
    }
}

/// Single-quoted TypeScript string literal.
fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Object key: bare when it is a valid identifier, quoted otherwise.
fn property_key(name: &str) -> String {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if valid {
        name.to_string()
    } else {
        quote(name)
    }
}

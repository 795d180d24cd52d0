//! # Static Extraction
//!
//! Reads declarations straight from source text. The structural tree is
//! walked breadth-first; every class whose superclass is `T::Struct` or
//! `T::Enum` becomes a declaration named by its enclosing `module`/`class`
//! nesting. Declarations are returned in reverse discovery order so that
//! nested types, which conventionally follow their parent, come first.
//!
//! ## Fields and variants
//!
//! `const :name, Type` and `prop :name, Type` are read identically;
//! trailing keyword arguments are ignored. A repeated field name keeps its
//! first position and its last type. Enum variants are the constants
//! assigned inside `enums do ... end`, upper-cased.
//!
//! ## Type aliases
//!
//! `Name = T.type_alias { expr }` anywhere in the unit is expanded where
//! `Name` is referenced, using the same lexical lookup as declaration
//! references. Expansion depth is bounded; a cycle degrades to unknown.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, warn};
use zodgen_core::{
    Declaration, DeclarationKind, Field, Primitive, QualifiedName, TypeExpr,
};

use crate::error::{ExtractError, ParseError};
use crate::expr::{parse_command_arguments, parse_expression, Expr};
use crate::parser::parse;
use crate::syntax::{Node, Statement};
use crate::token::Token;
use crate::{DeclarationResolver, Extractor, SourceUnit};

/// Alias expansions nested deeper than this are treated as a cycle.
const MAX_ALIAS_DEPTH: usize = 32;

/// A class extending one of the recognized bases.
pub(crate) struct FoundClass<'n> {
    pub(crate) name: QualifiedName,
    pub(crate) kind: DeclarationKind,
    pub(crate) body: &'n [Node],
}

/// A `T.type_alias` definition.
struct AliasDefinition {
    scope: QualifiedName,
    value: Expr,
}

/// Everything a breadth-first walk of one unit finds.
pub(crate) struct Discovery<'n> {
    pub(crate) classes: Vec<FoundClass<'n>>,
    aliases: HashMap<QualifiedName, AliasDefinition>,
}

/// Walks `nodes` breadth-first, collecting recognized classes in discovery
/// order along with every type alias.
pub(crate) fn discover(nodes: &[Node]) -> Discovery<'_> {
    let mut classes = Vec::new();
    let mut aliases = HashMap::new();
    let mut queue: VecDeque<(&Node, QualifiedName)> =
        nodes.iter().map(|n| (n, QualifiedName::default())).collect();

    while let Some((node, scope)) = queue.pop_front() {
        let inner_scope = match node {
            Node::Module { path, .. } => scope.join(&path.join("::")),
            Node::Class {
                path,
                superclass,
                body,
                ..
            } => {
                let name = scope.join(&path.join("::"));
                if let Some(kind) = base_kind(superclass) {
                    classes.push(FoundClass {
                        name: name.clone(),
                        kind,
                        body,
                    });
                }
                name
            }
            Node::Statement(statement) => {
                if let Some((alias, value)) = alias_definition(statement) {
                    aliases.insert(
                        scope.join(&alias),
                        AliasDefinition {
                            scope: scope.clone(),
                            value,
                        },
                    );
                }
                scope
            }
            Node::SingletonClass { .. } | Node::Method { .. } => scope,
        };
        for child in node.children() {
            queue.push_back((child, inner_scope.clone()));
        }
    }

    Discovery { classes, aliases }
}

/// The declaration kind named by a superclass clause, if recognized.
fn base_kind(superclass: &[Token]) -> Option<DeclarationKind> {
    if superclass.is_empty() {
        return None;
    }
    let expr = parse_expression(superclass);
    if expr.is_sorbet_const("Struct") {
        Some(DeclarationKind::Record)
    } else if expr.is_sorbet_const("Enum") {
        Some(DeclarationKind::Enum)
    } else {
        None
    }
}

/// `Name = T.type_alias { expr }` or the older `Name = T.type_alias(expr)`.
fn alias_definition(statement: &Statement) -> Option<(String, Expr)> {
    let name = statement.assigned_constant()?;
    let rhs = parse_expression(&statement.tokens[2..]);
    let Expr::Call {
        receiver: Some(receiver),
        method,
        args,
    } = rhs
    else {
        return None;
    };
    if method != "type_alias" || !is_t(&receiver) {
        return None;
    }

    let value = match statement.blocks.first() {
        Some(block) => match block.as_slice() {
            [Node::Statement(inner)] => parse_expression(&inner.tokens),
            _ => Expr::Opaque,
        },
        None => args.into_iter().next().unwrap_or(Expr::Opaque),
    };
    Some((name.to_string(), value))
}

fn is_t(expr: &Expr) -> bool {
    matches!(expr, Expr::Const { path, .. } if path.len() == 1 && path[0] == "T")
}

/// Maps type expressions to [`TypeExpr`] within one unit.
struct TypeClassifier<'d> {
    aliases: &'d HashMap<QualifiedName, AliasDefinition>,
}

impl TypeClassifier<'_> {
    fn classify(&self, expr: &Expr, scope: &QualifiedName, depth: usize) -> TypeExpr {
        match expr {
            Expr::Const { path, anchored } => self.classify_const(path, *anchored, scope, depth),
            Expr::Index { receiver, args } if receiver.is_sorbet_const("Array") => {
                match args.first() {
                    Some(element) => TypeExpr::array_of(self.classify(element, scope, depth)),
                    None => TypeExpr::Array(None),
                }
            }
            Expr::Index { receiver, args } if receiver.is_sorbet_const("Hash") => match args.as_slice() {
                [key, value] => TypeExpr::map_of(
                    self.classify(key, scope, depth),
                    self.classify(value, scope, depth),
                ),
                _ => TypeExpr::Map(None),
            },
            Expr::Call {
                receiver: Some(receiver),
                method,
                args,
            } if is_t(receiver) => match (method.as_str(), args.as_slice()) {
                ("nilable", [inner]) => TypeExpr::optional(self.classify(inner, scope, depth)),
                ("any", members) if !members.is_empty() => TypeExpr::union_of(
                    members
                        .iter()
                        .map(|m| self.classify(m, scope, depth))
                        .collect(),
                ),
                _ => TypeExpr::Unknown,
            },
            _ => TypeExpr::Unknown,
        }
    }

    fn classify_const(
        &self,
        path: &[String],
        anchored: bool,
        scope: &QualifiedName,
        depth: usize,
    ) -> TypeExpr {
        if let [namespace, name] = path {
            if namespace == "T" {
                return match name.as_str() {
                    "Boolean" => TypeExpr::Primitive(Primitive::Boolean),
                    "Array" => TypeExpr::Array(None),
                    "Hash" => TypeExpr::Map(None),
                    _ => TypeExpr::Unknown,
                };
            }
        }
        if let [name] = path {
            if let Some(primitive) = Primitive::from_class_name(name) {
                return TypeExpr::Primitive(primitive);
            }
        }

        let written = if anchored {
            format!("::{}", path.join("::"))
        } else {
            path.join("::")
        };
        let alias = scope
            .lexical_candidates(&written)
            .into_iter()
            .find_map(|candidate| self.aliases.get(&candidate).map(|def| (candidate, def)));
        match alias {
            Some((name, _)) if depth >= MAX_ALIAS_DEPTH => {
                warn!(alias = %name, "type alias expansion does not terminate; using unknown");
                TypeExpr::Unknown
            }
            Some((_, definition)) => self.classify(&definition.value, &definition.scope, depth + 1),
            None => TypeExpr::Reference(written),
        }
    }

    fn record_fields(&self, body: &[Node], scope: &QualifiedName) -> Vec<Field> {
        let mut fields: Vec<Field> = Vec::new();
        for node in body {
            let Node::Statement(statement) = node else {
                continue;
            };
            if !(statement.is_command("const") || statement.is_command("prop")) {
                continue;
            }
            let args = parse_command_arguments(&statement.tokens[1..]);
            let Some(Expr::Symbol(name)) = args.first() else {
                continue;
            };
            let ty = match args.get(1) {
                Some(Expr::Keyword { .. }) | None => TypeExpr::Unknown,
                Some(expr) => self.classify(expr, scope, 0),
            };
            match fields.iter_mut().find(|f| &f.name == name) {
                Some(existing) => existing.ty = ty,
                None => fields.push(Field::new(name.clone(), ty)),
            }
        }
        fields
    }
}

fn enum_variants(body: &[Node]) -> Vec<String> {
    body.iter()
        .filter_map(|node| match node {
            Node::Statement(statement) if statement.is_command("enums") => Some(statement),
            _ => None,
        })
        .flat_map(|statement| statement.blocks.iter().flatten())
        .filter_map(|node| match node {
            Node::Statement(statement) => statement.assigned_constant().map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Extracts declarations from source text.
///
/// References to types declared outside the unit are answered by the
/// optional resolver (usually a [`crate::ProjectIndex`]).
#[derive(Clone, Default)]
pub struct StaticExtractor {
    resolver: Option<Arc<dyn DeclarationResolver>>,
}

impl StaticExtractor {
    /// Extractor with no cross-unit resolution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor that resolves out-of-unit references through `resolver`.
    pub fn with_resolver(resolver: Arc<dyn DeclarationResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    /// Declarations in `source`, in reverse discovery order.
    pub fn extract_source(&self, source: &str) -> Result<Vec<Declaration>, ParseError> {
        let nodes = parse(source)?;
        let discovery = discover(&nodes);
        let classifier = TypeClassifier {
            aliases: &discovery.aliases,
        };

        let mut declarations: Vec<Declaration> = discovery
            .classes
            .iter()
            .map(|class| match class.kind {
                DeclarationKind::Record => Declaration::record(
                    class.name.clone(),
                    classifier.record_fields(class.body, &class.name),
                ),
                DeclarationKind::Enum => {
                    Declaration::enumeration(class.name.clone(), &enum_variants(class.body))
                }
            })
            .collect();
        declarations.reverse();
        Ok(declarations)
    }
}

impl std::fmt::Debug for StaticExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticExtractor")
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl Extractor for StaticExtractor {
    fn extract(&self, unit: &SourceUnit) -> Result<Vec<Declaration>, ExtractError> {
        let declarations = self
            .extract_source(&unit.text)
            .map_err(|source| ExtractError::Parse {
                path: unit.path.clone(),
                source,
            })?;
        debug!(
            path = %unit.path.display(),
            declarations = declarations.len(),
            "extracted declarations from source"
        );
        Ok(declarations)
    }

    fn resolve(
        &self,
        scope: &QualifiedName,
        reference: &str,
    ) -> Result<Option<Declaration>, ExtractError> {
        match &self.resolver {
            Some(resolver) => resolver.resolve(scope, reference),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zodgen_core::DeclarationBody;

    fn extract(source: &str) -> Vec<Declaration> {
        StaticExtractor::new().extract_source(source).unwrap()
    }

    fn fields(decl: &Declaration) -> &[Field] {
        match &decl.body {
            DeclarationBody::Record(fields) => fields,
            DeclarationBody::Enum(_) => panic!("expected record"),
        }
    }

    fn string() -> TypeExpr {
        TypeExpr::Primitive(Primitive::String)
    }

    fn number() -> TypeExpr {
        TypeExpr::Primitive(Primitive::Number)
    }

    #[test]
    fn reads_a_flat_record() {
        let decls = extract(
            "class User < T::Struct\n  const :name, String\n  prop :age, Integer\n  const :active, T::Boolean\n  const :tags, T::Array[String]\n  const :role, T.nilable(String)\nend\n",
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name.as_str(), "User");
        assert_eq!(
            fields(&decls[0]),
            &[
                Field::new("name", string()),
                Field::new("age", number()),
                Field::new("active", TypeExpr::Primitive(Primitive::Boolean)),
                Field::new("tags", TypeExpr::array_of(string())),
                Field::new("role", TypeExpr::optional(string())),
            ]
        );
    }

    #[test]
    fn nested_declarations_come_first() {
        let decls = extract(
            "class Payload < T::Struct\n  class Result < T::Struct\n    const :id, String\n  end\n  const :results, T::Array[Result]\nend\n",
        );
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Payload::Result", "Payload"]);
        assert_eq!(
            fields(&decls[1])[0].ty,
            TypeExpr::array_of(TypeExpr::reference("Result"))
        );
    }

    #[test]
    fn module_nesting_qualifies_names() {
        let decls = extract(
            "module Api\n  module V1\n    class Status < T::Enum\n      enums do\n        Active = new\n        inactive_legacy = 1\n        Pending = new('p')\n      end\n    end\n  end\nend\n",
        );
        assert_eq!(decls.len(), 1);
        assert_eq!(decls[0].name.as_str(), "Api::V1::Status");
        assert_eq!(
            decls[0].body,
            zodgen_core::DeclarationBody::Enum(vec!["ACTIVE".to_string(), "PENDING".to_string()])
        );
    }

    #[test]
    fn compact_class_path_is_qualified() {
        let decls = extract("class Api::User < ::T::Struct\nend\n");
        assert_eq!(decls[0].name.as_str(), "Api::User");
        assert!(fields(&decls[0]).is_empty());
    }

    #[test]
    fn unrecognized_bases_are_ignored() {
        let decls = extract("class Plain\nend\nclass Model < ApplicationRecord\nend\n");
        assert!(decls.is_empty());
    }

    #[test]
    fn collection_and_union_shapes() {
        let decls = extract(
            "class S < T::Struct\n  const :a, T::Array\n  const :b, T::Hash\n  const :c, T::Hash[String, Integer]\n  const :d, T::Hash[String]\n  const :e, T.any(String, Integer)\n  const :f, T.any(String, NilClass)\n  const :g, T.any(TrueClass, FalseClass)\nend\n",
        );
        let f = fields(&decls[0]);
        assert_eq!(f[0].ty, TypeExpr::Array(None));
        assert_eq!(f[1].ty, TypeExpr::Map(None));
        assert_eq!(f[2].ty, TypeExpr::map_of(string(), number()));
        assert_eq!(f[3].ty, TypeExpr::Map(None));
        assert_eq!(f[4].ty, TypeExpr::Union(vec![string(), number()]));
        assert_eq!(f[5].ty, TypeExpr::optional(string()));
        assert_eq!(
            f[6].ty,
            TypeExpr::Union(vec![
                TypeExpr::reference("TrueClass"),
                TypeExpr::reference("FalseClass")
            ])
        );
    }

    #[test]
    fn unsupported_shapes_are_unknown() {
        let decls = extract(
            "class S < T::Struct\n  const :a, T.untyped\n  const :b, T.class_of(String)\n  const :c, T.all(A, B)\n  const :d, T::Set[String]\n  const :e, 'literal'\n  const :f\n  const :g, default: 1\nend\n",
        );
        let f = fields(&decls[0]);
        assert_eq!(f.len(), 7);
        assert!(f.iter().all(|field| field.ty == TypeExpr::Unknown));
    }

    #[test]
    fn keyword_arguments_after_the_type_are_ignored() {
        let decls = extract(
            "class S < T::Struct\n  prop :count, Integer, default: 0, factory: -> { 1 + 1 }\nend\n",
        );
        assert_eq!(fields(&decls[0]), &[Field::new("count", number())]);
    }

    #[test]
    fn repeated_field_keeps_position_and_last_type() {
        let decls = extract(
            "class S < T::Struct\n  const :a, String\n  const :b, String\n  const :a, Integer\nend\n",
        );
        assert_eq!(
            fields(&decls[0]),
            &[Field::new("a", number()), Field::new("b", string())]
        );
    }

    #[test]
    fn type_aliases_expand_lexically() {
        let decls = extract(
            "module Api\n  Id = T.type_alias { T.any(String, Integer) }\n  class User < T::Struct\n    Tags = T.type_alias { T::Array[String] }\n    const :id, Id\n    const :tags, Tags\n    const :maybe, T.nilable(Tags)\n  end\nend\n",
        );
        let f = fields(&decls[0]);
        assert_eq!(f[0].ty, TypeExpr::Union(vec![string(), number()]));
        assert_eq!(f[1].ty, TypeExpr::array_of(string()));
        assert_eq!(f[2].ty, TypeExpr::optional(TypeExpr::array_of(string())));
    }

    #[test]
    fn alias_cycles_degrade_to_unknown() {
        let decls = extract(
            "A = T.type_alias { B }\nB = T.type_alias { T.nilable(A) }\nclass S < T::Struct\n  const :x, A\nend\n",
        );
        let ty = &fields(&decls[0])[0].ty;
        let mut current = ty;
        while let TypeExpr::Optional(inner) = current {
            current = inner;
        }
        assert_eq!(current, &TypeExpr::Unknown);
    }

    #[test]
    fn methods_and_sigs_do_not_produce_fields() {
        let decls = extract(
            "class S < T::Struct\n  extend T::Sig\n  const :a, String\n\n  sig { returns(String) }\n  def label\n    prop = 'x'\n    \"#{a}!\"\n  end\nend\n",
        );
        assert_eq!(fields(&decls[0]), &[Field::new("a", string())]);
    }

    #[test]
    fn regexp_and_character_literals_do_not_break_the_unit() {
        let decls = extract(
            "class S < T::Struct\n  const :name, String\n\n  def slug\n    name.gsub(/[^a-z']/, '-')\n  end\n\n  def spaced?\n    name.match?(/ do /) || name[0] == ?'\n  end\nend\n",
        );
        assert_eq!(fields(&decls[0]), &[Field::new("name", string())]);
    }

    #[test]
    fn absurdly_deep_types_degrade_instead_of_overflowing() {
        let depth = 20_000;
        let source = format!(
            "class S < T::Struct\n  const :a, {}String{}\n  const :b, String\nend\n",
            "T.nilable(".repeat(depth),
            ")".repeat(depth)
        );
        let decls = extract(&source);
        let record = fields(&decls[0]);
        assert_eq!(record.len(), 2);
        assert_eq!(record[1], Field::new("b", string()));
    }

    #[test]
    fn syntax_error_fails_the_unit() {
        let err = StaticExtractor::new()
            .extract_source("class S < T::Struct\n  const :a, String\n")
            .unwrap_err();
        assert!(err.message.contains("end of file"));
    }

    #[test]
    fn extract_wraps_parse_errors_with_the_path() {
        let unit = SourceUnit::new("app/zodgen/broken.rb", "class S < T::Struct\n");
        let err = StaticExtractor::new().extract(&unit).unwrap_err();
        assert!(matches!(err, ExtractError::Parse { ref path, .. } if path.ends_with("broken.rb")));
    }
}

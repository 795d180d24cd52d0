//! # Declarations and Type Expressions
//!
//! The shared data model produced by both extractors and consumed by the
//! translator. Every entity here is transient: it lives for one translation
//! run and nothing is persisted except the generated files.

use crate::identity::QualifiedName;

/// Source-language name of the `true` sentinel class.
pub const TRUE_SENTINEL: &str = "TrueClass";
/// Source-language name of the `false` sentinel class.
pub const FALSE_SENTINEL: &str = "FalseClass";
/// Source-language name of the nil class, folded into `Optional`.
pub const NIL_SENTINEL: &str = "NilClass";

/// Scalar shapes with a direct schema equivalent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// `String`.
    String,
    /// `Integer`, `Float`, `Numeric`.
    Number,
    /// `T::Boolean`.
    Boolean,
}

impl Primitive {
    /// Classify a bare class name, if it names a primitive.
    pub fn from_class_name(name: &str) -> Option<Self> {
        match name.trim_start_matches("::") {
            "String" => Some(Self::String),
            "Integer" | "Float" | "Numeric" => Some(Self::Number),
            _ => None,
        }
    }
}

/// A field's type, as a recursive tagged variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExpr {
    /// A scalar.
    Primitive(Primitive),
    /// A nilable wrapper.
    Optional(Box<TypeExpr>),
    /// A homogeneous array; `None` when the element type is absent.
    Array(Option<Box<TypeExpr>>),
    /// A homogeneous map; `None` when the key/value arity was not exactly two.
    Map(Option<Box<(TypeExpr, TypeExpr)>>),
    /// A union of members in declared order.
    Union(Vec<TypeExpr>),
    /// A reference to another declaration, as written (possibly relative).
    Reference(String),
    /// Anything the translator has no equivalent for.
    Unknown,
}

impl TypeExpr {
    /// `Optional(inner)`.
    pub fn optional(inner: TypeExpr) -> Self {
        Self::Optional(Box::new(inner))
    }

    /// `Array(Some(inner))`.
    pub fn array_of(inner: TypeExpr) -> Self {
        Self::Array(Some(Box::new(inner)))
    }

    /// `Map(Some((key, value)))`.
    pub fn map_of(key: TypeExpr, value: TypeExpr) -> Self {
        Self::Map(Some(Box::new((key, value))))
    }

    /// `Reference(name)`.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::Reference(name.into())
    }

    /// The two-member union that spells a boolean in the source language.
    pub fn boolean_pair() -> Self {
        Self::Union(vec![
            Self::Reference(TRUE_SENTINEL.to_string()),
            Self::Reference(FALSE_SENTINEL.to_string()),
        ])
    }

    /// Build a union from declared members, folding `NilClass` members into
    /// an `Optional` wrapper.
    ///
    /// One remaining member collapses to that member; none at all is
    /// `Unknown`.
    pub fn union_of(members: Vec<TypeExpr>) -> Self {
        let before = members.len();
        let members: Vec<TypeExpr> = members
            .into_iter()
            .filter(|m| !matches!(m, Self::Reference(r) if r.trim_start_matches("::") == NIL_SENTINEL))
            .collect();
        let nilable = members.len() != before;

        let inner = match members.len() {
            0 => return Self::Unknown,
            1 => members.into_iter().next().unwrap_or(Self::Unknown),
            _ => Self::Union(members),
        };
        if nilable {
            Self::optional(inner)
        } else {
            inner
        }
    }

    /// Whether `members` is exactly the `TrueClass`/`FalseClass` pair, in
    /// either order.
    pub fn is_boolean_pair(members: &[TypeExpr]) -> bool {
        match members {
            [Self::Reference(a), Self::Reference(b)] => {
                let (a, b) = (a.trim_start_matches("::"), b.trim_start_matches("::"));
                (a == TRUE_SENTINEL && b == FALSE_SENTINEL)
                    || (a == FALSE_SENTINEL && b == TRUE_SENTINEL)
            }
            _ => false,
        }
    }
}

/// A named, typed field of a Record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Field name as declared.
    pub name: String,
    /// Field type.
    pub ty: TypeExpr,
}

impl Field {
    /// Create a field.
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Which of the two recognized base kinds a declaration extends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    /// `T::Struct`.
    Record,
    /// `T::Enum`.
    Enum,
}

impl DeclarationKind {
    /// Suffix appended to the schema identifier.
    pub fn identifier_suffix(&self) -> &'static str {
        match self {
            Self::Record => "Schema",
            Self::Enum => "Enum",
        }
    }
}

impl std::fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Record => "record",
            Self::Enum => "enum",
        };
        f.write_str(s)
    }
}

/// Contents of a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationBody {
    /// Ordered fields.
    Record(Vec<Field>),
    /// Ordered, case-normalized variant names.
    Enum(Vec<String>),
}

/// A Record or Enum declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Fully-qualified name; unique within a compiled unit.
    pub name: QualifiedName,
    /// Fields or variants.
    pub body: DeclarationBody,
}

impl Declaration {
    /// A Record with the given fields.
    pub fn record(name: impl Into<QualifiedName>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            body: DeclarationBody::Record(fields),
        }
    }

    /// An Enum with the given variants, normalized via [`normalize_variant`].
    pub fn enumeration<S: AsRef<str>>(name: impl Into<QualifiedName>, variants: &[S]) -> Self {
        Self {
            name: name.into(),
            body: DeclarationBody::Enum(
                variants.iter().map(|v| normalize_variant(v.as_ref())).collect(),
            ),
        }
    }

    /// Record or Enum.
    pub fn kind(&self) -> DeclarationKind {
        match self.body {
            DeclarationBody::Record(_) => DeclarationKind::Record,
            DeclarationBody::Enum(_) => DeclarationKind::Enum,
        }
    }

    /// Name of the emitted schema constant: namespace segments concatenated
    /// plus `Schema` or `Enum`.
    pub fn schema_identifier(&self) -> String {
        format!("{}{}", self.name.stem(), self.kind().identifier_suffix())
    }

    /// Name of the emitted inferred-type alias.
    pub fn type_alias(&self) -> String {
        self.name.stem()
    }
}

/// Case-normalize an enum variant name (upper case).
pub fn normalize_variant(name: &str) -> String {
    name.trim().to_uppercase()
}

//! Tokens produced by the lexer and consumed by the structural parser.

/// A span of source text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset where this span starts.
    pub start: usize,
    /// Byte offset where this span ends (exclusive).
    pub end: usize,
    /// 1-based line number where this span starts.
    pub line: u32,
    /// 1-based column number where this span starts.
    pub column: u32,
}

impl Span {
    /// Creates a new span.
    pub const fn new(start: usize, end: usize, line: u32, column: u32) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
    /// Whether whitespace separates this token from the previous one.
    /// Distinguishes `T::Array[String]` (index) from `puts [1]` (argument).
    pub space_before: bool,
}

impl Token {
    /// Creates a new token.
    pub const fn new(kind: TokenKind, span: Span, space_before: bool) -> Self {
        Self {
            kind,
            span,
            space_before,
        }
    }

    /// Whether this token is the bare word `word` (keywords are words).
    pub fn is_word(&self, word: &str) -> bool {
        matches!(&self.kind, TokenKind::Ident(name) if name == word)
    }

    /// Whether this token is the operator `op`.
    pub fn is_op(&self, op: &str) -> bool {
        matches!(&self.kind, TokenKind::Op(o) if o == op)
    }

    /// Whether this token ends a statement.
    pub fn is_separator(&self) -> bool {
        matches!(self.kind, TokenKind::Newline | TokenKind::Semicolon)
    }
}

/// Token types for the supported Ruby subset.
///
/// Keywords are not distinguished lexically; they arrive as
/// [`TokenKind::Ident`] and the parser decides by position.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Capitalized name: `Foo`, `T`, `RED`.
    Constant(String),
    /// Lower-case name, keyword, or sigiled variable: `prop`, `end`, `@x`.
    Ident(String),
    /// `name:` inside an argument list or hash.
    Label(String),
    /// `:name` or `:"name"`.
    Symbol(String),
    /// String, heredoc, or percent literal; contents are not interpreted.
    Str(String),
    /// Numeric literal, kept as written.
    Number(String),
    /// `::`
    ColonColon,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// Any other operator: `=`, `<`, `<<`, `|`, `=>`, `&.` and friends.
    Op(String),
    /// End of a line outside a string.
    Newline,
    /// `;`
    Semicolon,
    /// End of input.
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constant(s) | Self::Ident(s) | Self::Number(s) | Self::Op(s) => f.write_str(s),
            Self::Label(s) => write!(f, "{s}:"),
            Self::Symbol(s) => write!(f, ":{s}"),
            Self::Str(_) => f.write_str("string literal"),
            Self::ColonColon => f.write_str("::"),
            Self::Dot => f.write_str("."),
            Self::Comma => f.write_str(","),
            Self::LParen => f.write_str("("),
            Self::RParen => f.write_str(")"),
            Self::LBracket => f.write_str("["),
            Self::RBracket => f.write_str("]"),
            Self::LBrace => f.write_str("{"),
            Self::RBrace => f.write_str("}"),
            Self::Newline => f.write_str("newline"),
            Self::Semicolon => f.write_str(";"),
            Self::Eof => f.write_str("end of file"),
        }
    }
}

/// Reserved words of the source language.
const KEYWORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or", "redo",
    "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield",
];

/// Whether `word` is a reserved word.
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

//! Structural syntax tree.
//!
//! The parser only commits to the structure that matters for finding
//! declarations: `module` and `class` nesting with their bodies, and
//! statements with any attached `do ... end` / `{ ... }` blocks parsed
//! recursively. Statement contents stay as token runs; the expression
//! parser in [`crate::expr`] interprets the few statement shapes that carry
//! type information.

use crate::token::{Span, Token, TokenKind};

/// A node in the structural tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// `module A::B ... end`.
    Module {
        /// Constant path segments as written.
        path: Vec<String>,
        /// Body nodes.
        body: Vec<Node>,
        /// Location of the `module` keyword.
        span: Span,
    },
    /// `class A::B < Base ... end`.
    Class {
        /// Constant path segments as written.
        path: Vec<String>,
        /// Tokens of the superclass expression; empty when absent.
        superclass: Vec<Token>,
        /// Body nodes.
        body: Vec<Node>,
        /// Location of the `class` keyword.
        span: Span,
    },
    /// `class << self ... end`; does not open a new namespace.
    SingletonClass {
        /// Body nodes.
        body: Vec<Node>,
        /// Location of the `class` keyword.
        span: Span,
    },
    /// `def ... end`; the body is skipped.
    Method {
        /// Location of the `def` keyword.
        span: Span,
    },
    /// Any other statement.
    Statement(Statement),
}

impl Node {
    /// Direct child nodes, in source order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Self::Module { body, .. } | Self::Class { body, .. } | Self::SingletonClass { body, .. } => {
                body.iter().collect()
            }
            Self::Method { .. } => Vec::new(),
            Self::Statement(statement) => statement.blocks.iter().flatten().collect(),
        }
    }
}

/// A statement: its tokens up to the separator, plus attached blocks.
#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    /// Tokens outside attached blocks, newlines inside brackets included.
    pub tokens: Vec<Token>,
    /// Bodies of `do ... end` and `{ ... }` blocks attached at the top level
    /// of the statement, in order.
    pub blocks: Vec<Vec<Node>>,
}

impl Statement {
    /// Whether the statement is a call to `name` with no receiver, such as
    /// `prop :id, String` or `enums do`.
    pub fn is_command(&self, name: &str) -> bool {
        self.tokens.first().is_some_and(|t| t.is_word(name))
    }

    /// For `NAME = ...`, the assigned constant name.
    pub fn assigned_constant(&self) -> Option<&str> {
        match self.tokens.as_slice() {
            [Token {
                kind: TokenKind::Constant(name),
                ..
            }, op, ..]
                if op.is_op("=") =>
            {
                Some(name)
            }
            _ => None,
        }
    }
}

//! Expression parser for statement token runs.
//!
//! Understands constant paths, method calls with or without receivers,
//! index expressions, literals, and keyword arguments: enough for field
//! declarations, type expressions, and superclass clauses. Anything else
//! becomes [`Expr::Opaque`] rather than an error; a field whose type cannot
//! be read is reported as unknown, not as a broken unit. Nesting deeper
//! than [`MAX_NESTING`] is opaque too.

use crate::token::{Token, TokenKind};

/// Deepest argument nesting parsed before the rest becomes opaque.
pub const MAX_NESTING: usize = 64;

/// A parsed expression.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// `A::B::C`, optionally anchored with a leading `::`.
    Const {
        /// Path segments.
        path: Vec<String>,
        /// Whether the path starts with `::`.
        anchored: bool,
    },
    /// A bare lower-case name: local, method call without arguments,
    /// `nil`, `self`.
    Ident(String),
    /// `:name`.
    Symbol(String),
    /// String literal.
    Str(String),
    /// Numeric literal.
    Number(String),
    /// `receiver.method(args)` or `method(args)`.
    Call {
        /// Receiver, if any.
        receiver: Option<Box<Expr>>,
        /// Method name.
        method: String,
        /// Positional and keyword arguments.
        args: Vec<Expr>,
    },
    /// `receiver[args]`.
    Index {
        /// Indexed expression.
        receiver: Box<Expr>,
        /// Index arguments.
        args: Vec<Expr>,
    },
    /// `key: value` argument.
    Keyword {
        /// Label name.
        key: String,
        /// Value expression.
        value: Box<Expr>,
    },
    /// Anything outside the supported subset.
    Opaque,
}

impl Expr {
    /// The constant path as written (`::A::B` when anchored), if this is
    /// a constant.
    pub fn const_path(&self) -> Option<String> {
        match self {
            Self::Const { path, anchored } => {
                let joined = path.join("::");
                Some(if *anchored { format!("::{joined}") } else { joined })
            }
            _ => None,
        }
    }

    /// Whether this is the constant `T::<name>` (anchored or not).
    pub fn is_sorbet_const(&self, name: &str) -> bool {
        matches!(self, Self::Const { path, .. } if path.len() == 2 && path[0] == "T" && path[1] == name)
    }
}

/// Parses one expression from `tokens`; trailing tokens make it opaque.
pub fn parse_expression(tokens: &[Token]) -> Expr {
    let mut parser = ExprParser::new(tokens);
    let expr = parser.parse_value(None);
    if parser.at_end() {
        expr
    } else {
        Expr::Opaque
    }
}

/// Parses the arguments of a command call, given the tokens after the
/// method name: either `(a, b)` or bare `a, b`.
pub fn parse_command_arguments(tokens: &[Token]) -> Vec<Expr> {
    let mut parser = ExprParser::new(tokens);
    match parser.peek() {
        Some(t) if t.kind == TokenKind::LParen && !t.space_before => {
            parser.advance();
            parser.parse_arguments(Some(&TokenKind::RParen))
        }
        _ => parser.parse_arguments(None),
    }
}

struct ExprParser<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    depth: usize,
}

impl<'a> ExprParser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens: tokens.iter().filter(|t| t.kind != TokenKind::Newline).collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek().is_some_and(|t| &t.kind == kind)
    }

    fn parse_arguments(&mut self, closer: Option<&TokenKind>) -> Vec<Expr> {
        let mut args = Vec::new();
        loop {
            if self.at_end() || closer.is_some_and(|c| self.at(c)) {
                break;
            }
            args.push(self.parse_argument(closer));
            if self.at(&TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        if closer.is_some_and(|c| self.at(c)) {
            self.advance();
        }
        args
    }

    fn parse_argument(&mut self, closer: Option<&TokenKind>) -> Expr {
        if let Some(TokenKind::Label(key)) = self.peek().map(|t| &t.kind) {
            self.advance();
            let value = self.parse_value(closer);
            return Expr::Keyword {
                key: key.clone(),
                value: Box::new(value),
            };
        }
        let value = self.parse_value(closer);
        if self.peek().is_some_and(|t| t.is_op("=>")) {
            self.skip_to_argument_end(closer);
            return Expr::Opaque;
        }
        value
    }

    /// A postfix expression that must be followed by an argument boundary.
    fn parse_value(&mut self, closer: Option<&TokenKind>) -> Expr {
        if self.depth >= MAX_NESTING {
            self.skip_to_argument_end(closer);
            return Expr::Opaque;
        }
        self.depth += 1;
        let expr = self.parse_postfix();
        self.depth -= 1;
        let boundary = self.at_end()
            || self.at(&TokenKind::Comma)
            || closer.is_some_and(|c| self.at(c))
            || self.peek().is_some_and(|t| t.is_op("=>"));
        if boundary {
            expr
        } else {
            self.skip_to_argument_end(closer);
            Expr::Opaque
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            let Some(token) = self.peek() else {
                return expr;
            };
            match &token.kind {
                TokenKind::Dot => {
                    self.advance();
                    expr = self.parse_method_call(Some(expr));
                }
                TokenKind::Op(op) if op == "&." => {
                    self.advance();
                    expr = self.parse_method_call(Some(expr));
                }
                TokenKind::ColonColon => {
                    self.advance();
                    match (expr, self.advance().map(|t| &t.kind)) {
                        (Expr::Const { mut path, anchored }, Some(TokenKind::Constant(name))) => {
                            path.push(name.clone());
                            expr = Expr::Const { path, anchored };
                        }
                        _ => return Expr::Opaque,
                    }
                }
                TokenKind::LBracket if !token.space_before => {
                    self.advance();
                    let args = self.parse_arguments(Some(&TokenKind::RBracket));
                    expr = Expr::Index {
                        receiver: Box::new(expr),
                        args,
                    };
                }
                _ => return expr,
            }
        }
    }

    fn parse_method_call(&mut self, receiver: Option<Expr>) -> Expr {
        let method = match self.advance().map(|t| &t.kind) {
            Some(TokenKind::Ident(name) | TokenKind::Constant(name)) => name.clone(),
            _ => return Expr::Opaque,
        };
        let args = self.parse_call_parens();
        Expr::Call {
            receiver: receiver.map(Box::new),
            method,
            args,
        }
    }

    fn parse_call_parens(&mut self) -> Vec<Expr> {
        match self.peek() {
            Some(t) if t.kind == TokenKind::LParen && !t.space_before => {
                self.advance();
                self.parse_arguments(Some(&TokenKind::RParen))
            }
            _ => Vec::new(),
        }
    }

    fn parse_primary(&mut self) -> Expr {
        let Some(token) = self.advance() else {
            return Expr::Opaque;
        };
        match &token.kind {
            TokenKind::ColonColon => match self.advance().map(|t| &t.kind) {
                Some(TokenKind::Constant(name)) => Expr::Const {
                    path: vec![name.clone()],
                    anchored: true,
                },
                _ => Expr::Opaque,
            },
            TokenKind::Constant(name) => {
                if self.peek().is_some_and(|t| t.kind == TokenKind::LParen && !t.space_before) {
                    let args = self.parse_call_parens();
                    Expr::Call {
                        receiver: None,
                        method: name.clone(),
                        args,
                    }
                } else {
                    Expr::Const {
                        path: vec![name.clone()],
                        anchored: false,
                    }
                }
            }
            TokenKind::Ident(name) => {
                if self.peek().is_some_and(|t| t.kind == TokenKind::LParen && !t.space_before) {
                    let args = self.parse_call_parens();
                    Expr::Call {
                        receiver: None,
                        method: name.clone(),
                        args,
                    }
                } else {
                    Expr::Ident(name.clone())
                }
            }
            TokenKind::Symbol(name) => Expr::Symbol(name.clone()),
            TokenKind::Str(text) => Expr::Str(text.clone()),
            TokenKind::Number(text) => Expr::Number(text.clone()),
            TokenKind::LParen => {
                let inner = self.parse_value(Some(&TokenKind::RParen));
                if self.at(&TokenKind::RParen) {
                    self.advance();
                    inner
                } else {
                    Expr::Opaque
                }
            }
            TokenKind::LBracket | TokenKind::LBrace => {
                self.pos -= 1;
                self.skip_balanced();
                Expr::Opaque
            }
            _ => Expr::Opaque,
        }
    }

    /// Skips one bracketed group starting at the current opening bracket.
    fn skip_balanced(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.advance() {
            match token.kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    /// Advances to the next comma or closer at bracket depth zero.
    fn skip_to_argument_end(&mut self, closer: Option<&TokenKind>) {
        let mut depth = 0usize;
        while let Some(token) = self.peek() {
            match &token.kind {
                TokenKind::Comma if depth == 0 => return,
                kind if depth == 0 && closer.is_some_and(|c| c == kind) => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }
}

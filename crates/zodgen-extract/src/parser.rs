//! # Structural Parser
//!
//! Turns the token stream into a tree of [`Node`]s. Keyword-delimited
//! constructs (`class`, `module`, `def`, `do`, `begin`, `case`, and
//! statement-leading `if`/`unless`/`while`/`until`) are matched with their
//! `end` so that nesting is known exactly; statement contents are kept as
//! tokens.
//!
//! ## Keyword positions
//!
//! `if` and friends open a block only where an expression may start
//! (after a separator, an operator, an opening bracket); elsewhere they are
//! modifiers. A word after `.` or `&.` is a method name, never a keyword.
//! The `do` of `while cond do` belongs to the loop, not to a block.
//!
//! ## Errors
//!
//! A stray `end` or closing bracket, or a construct left open at end of
//! file, is a [`ParseError`].

use crate::error::ParseError;
use crate::lexer::tokenize;
use crate::syntax::{Node, Statement};
use crate::token::{is_keyword, Span, Token, TokenKind};

/// What closes the node list being parsed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Terminator {
    Eof,
    End,
    Brace,
}

impl Terminator {
    fn describe(self) -> &'static str {
        match self {
            Self::Eof => "end of file",
            Self::End => "`end`",
            Self::Brace => "`}`",
        }
    }
}

/// Parses a whole source unit.
pub fn parse(source: &str) -> Result<Vec<Node>, ParseError> {
    let tokens = tokenize(source)?;
    Parser::new(tokens).parse_program()
}

/// Parser state over a token vector that always ends with `Eof`.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    /// Creates a parser, appending `Eof` if the stream lacks one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let span = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token::new(TokenKind::Eof, span, true));
        }
        Self { tokens, pos: 0 }
    }

    /// Parses top-level nodes until end of file.
    pub fn parse_program(mut self) -> Result<Vec<Node>, ParseError> {
        self.parse_nodes(Terminator::Eof)
    }

    fn token_at(&self, index: usize) -> &Token {
        &self.tokens[index.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &Token {
        self.token_at(self.pos)
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn skip_separators(&mut self) {
        while self.peek().is_separator() {
            self.advance();
        }
    }

    fn parse_nodes(&mut self, terminator: Terminator) -> Result<Vec<Node>, ParseError> {
        let mut nodes = Vec::new();
        loop {
            self.skip_separators();
            let token = self.peek();
            let closes = match &token.kind {
                TokenKind::Eof => Some(Terminator::Eof),
                TokenKind::Ident(word) if word == "end" => Some(Terminator::End),
                TokenKind::RBrace => Some(Terminator::Brace),
                TokenKind::RParen | TokenKind::RBracket => {
                    return Err(ParseError::at(
                        token.span,
                        format!("unexpected `{}`", token.kind),
                    ));
                }
                _ => None,
            };
            match closes {
                Some(found) if found == terminator => return Ok(nodes),
                Some(Terminator::Eof) => {
                    return Err(ParseError::at(
                        token.span,
                        format!("unexpected end of file, expected {}", terminator.describe()),
                    ));
                }
                Some(_) => {
                    return Err(ParseError::at(
                        token.span,
                        format!(
                            "unexpected `{}`, expected {}",
                            token.kind,
                            terminator.describe()
                        ),
                    ));
                }
                None => nodes.push(self.parse_node()?),
            }
        }
    }

    /// Parses a body terminated by `end` and consumes the `end`.
    fn parse_body(&mut self) -> Result<Vec<Node>, ParseError> {
        let body = self.parse_nodes(Terminator::End)?;
        self.advance();
        Ok(body)
    }

    fn parse_node(&mut self) -> Result<Node, ParseError> {
        let token = self.peek();
        if token.is_word("module") {
            return self.parse_module();
        }
        if token.is_word("class") {
            return self.parse_class();
        }
        if token.is_word("def") && !self.def_is_endless(self.pos) {
            return self.skip_method();
        }
        Ok(Node::Statement(self.collect_statement()?))
    }

    fn parse_module(&mut self) -> Result<Node, ParseError> {
        let keyword = self.advance();
        let path = self.parse_const_path()?;
        let body = self.parse_body()?;
        Ok(Node::Module {
            path,
            body,
            span: keyword.span,
        })
    }

    fn parse_class(&mut self) -> Result<Node, ParseError> {
        let keyword = self.advance();
        if self.peek().is_op("<<") {
            self.advance();
            self.collect_statement()?;
            let body = self.parse_body()?;
            return Ok(Node::SingletonClass {
                body,
                span: keyword.span,
            });
        }

        let path = self.parse_const_path()?;
        let superclass = if self.peek().is_op("<") {
            self.advance();
            self.collect_statement()?.tokens
        } else {
            Vec::new()
        };
        let body = self.parse_body()?;
        Ok(Node::Class {
            path,
            superclass,
            body,
            span: keyword.span,
        })
    }

    fn parse_const_path(&mut self) -> Result<Vec<String>, ParseError> {
        if self.peek().is_word("self") && self.token_at(self.pos + 1).kind == TokenKind::ColonColon {
            self.advance();
        }
        if self.peek().kind == TokenKind::ColonColon {
            self.advance();
        }

        let mut path = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Constant(name) => path.push(name),
                other => {
                    return Err(ParseError::at(
                        token.span,
                        format!("expected a constant name, found `{other}`"),
                    ));
                }
            }
            if self.peek().kind == TokenKind::ColonColon {
                self.advance();
            } else {
                return Ok(path);
            }
        }
    }

    fn skip_method(&mut self) -> Result<Node, ParseError> {
        let span = self.peek().span;
        self.pos = self.signature_end(self.pos);

        let mut depth = 1usize;
        loop {
            let index = self.pos;
            let token = self.peek();
            if token.kind == TokenKind::Eof {
                return Err(ParseError::at(
                    span,
                    "method definition is never closed with `end`",
                ));
            }
            if token.is_word("end") && !self.after_dot(index) {
                depth -= 1;
                self.advance();
                if depth == 0 {
                    return Ok(Node::Method { span });
                }
                continue;
            }
            if self.opens_keyword_block(index) {
                depth += 1;
            }
            self.advance();
        }
    }

    /// Index of the first token after a method signature (name and
    /// parameters) that starts at the `def` at `def_index`.
    fn signature_end(&self, def_index: usize) -> usize {
        let mut i = def_index + 1;
        let skip_name = |i: usize| -> usize {
            if self.token_at(i).kind == TokenKind::LBracket {
                i + 2
            } else {
                i + 1
            }
        };

        i = skip_name(i);
        if matches!(self.token_at(i).kind, TokenKind::Dot) {
            i = skip_name(i + 1);
        }
        let setter = self.token_at(i);
        if setter.is_op("=")
            && !setter.space_before
            && self.token_at(i + 1).kind == TokenKind::LParen
        {
            i += 1;
        }

        let next = self.token_at(i);
        if next.kind == TokenKind::LParen && !next.space_before {
            return self.matching_close(i) + 1;
        }
        if next.is_separator() || next.is_op("=") {
            return i;
        }
        let mut depth = 0usize;
        loop {
            let token = self.token_at(i);
            match token.kind {
                TokenKind::Eof => return i,
                TokenKind::Newline | TokenKind::Semicolon if depth == 0 => return i,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Index of the bracket closing the one at `open_index`, or of `Eof`.
    fn matching_close(&self, open_index: usize) -> usize {
        let mut depth = 0usize;
        let mut i = open_index;
        loop {
            match self.token_at(i).kind {
                TokenKind::Eof => return i,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    fn def_is_endless(&self, def_index: usize) -> bool {
        self.token_at(self.signature_end(def_index)).is_op("=")
    }

    fn collect_statement(&mut self) -> Result<Statement, ParseError> {
        let start: Span = self.peek().span;
        let mut tokens = Vec::new();
        let mut blocks = Vec::new();
        let mut depth = 0usize;

        loop {
            let index = self.pos;
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => {
                    if depth > 0 {
                        return Err(ParseError::at(
                            start,
                            "statement is still open at end of file",
                        ));
                    }
                    break;
                }
                TokenKind::Newline if depth == 0 => {
                    if self.continues_after_newline(&tokens) {
                        self.advance();
                        continue;
                    }
                    break;
                }
                TokenKind::Semicolon if depth == 0 => break,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::Ident(word) if word == "end" && depth == 0 && !self.after_dot(index) => {
                    break;
                }
                TokenKind::RParen | TokenKind::RBracket if depth == 0 => {
                    return Err(ParseError::at(
                        token.span,
                        format!("unexpected `{}`", token.kind),
                    ));
                }
                TokenKind::Ident(word)
                    if word == "do" && depth == 0 && !self.after_dot(index) && !self.is_loop_do(index) =>
                {
                    self.advance();
                    self.skip_block_params();
                    blocks.push(self.parse_body()?);
                    continue;
                }
                TokenKind::LBrace if depth == 0 && self.brace_opens_block(index) => {
                    self.advance();
                    self.skip_block_params();
                    blocks.push(self.parse_nodes(Terminator::Brace)?);
                    self.advance();
                    continue;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => depth -= 1,
                TokenKind::Ident(word) if word == "end" && !self.after_dot(index) => depth -= 1,
                _ if self.opens_keyword_block(index) => depth += 1,
                _ => {}
            }
            tokens.push(token);
            self.advance();
        }

        Ok(Statement { tokens, blocks })
    }

    /// A line ending in a comma, operator, or dot continues on the next
    /// line, as does a next line starting with `.` or `&.`.
    fn continues_after_newline(&self, tokens: &[Token]) -> bool {
        let trailing = tokens.last().is_some_and(|last| match &last.kind {
            TokenKind::Comma
            | TokenKind::Dot
            | TokenKind::ColonColon
            | TokenKind::Label(_)
            | TokenKind::Op(_) => true,
            TokenKind::Ident(word) => matches!(word.as_str(), "and" | "or" | "not"),
            _ => false,
        });
        if trailing {
            return true;
        }

        let mut i = self.pos;
        while self.token_at(i).kind == TokenKind::Newline {
            i += 1;
        }
        let next = self.token_at(i);
        !tokens.is_empty() && (next.kind == TokenKind::Dot || next.is_op("&."))
    }

    fn skip_block_params(&mut self) {
        if self.peek().is_op("||") {
            self.advance();
            return;
        }
        if !self.peek().is_op("|") {
            return;
        }
        self.advance();
        loop {
            let token = self.peek();
            if token.is_op("|") {
                self.advance();
                return;
            }
            if matches!(token.kind, TokenKind::Eof | TokenKind::Newline) {
                return;
            }
            self.advance();
        }
    }

    fn previous_kind(&self, index: usize) -> Option<&TokenKind> {
        index.checked_sub(1).map(|i| &self.token_at(i).kind)
    }

    fn after_dot(&self, index: usize) -> bool {
        match self.previous_kind(index) {
            Some(TokenKind::Dot) => true,
            Some(TokenKind::Op(op)) => op == "&.",
            _ => false,
        }
    }

    /// `{` opens a block after a method name, a closing parenthesis, or a
    /// lambda arrow; elsewhere it opens a hash literal.
    fn brace_opens_block(&self, index: usize) -> bool {
        match self.previous_kind(index) {
            Some(TokenKind::Ident(word)) => !is_keyword(word) || word == "super",
            Some(TokenKind::RParen) => true,
            Some(TokenKind::Op(op)) => op == "->",
            _ => false,
        }
    }

    fn at_expression_start(&self, index: usize) -> bool {
        match self.previous_kind(index) {
            None
            | Some(
                TokenKind::Newline
                | TokenKind::Semicolon
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Comma
                | TokenKind::Label(_)
                | TokenKind::Op(_),
            ) => true,
            Some(TokenKind::Ident(word)) => matches!(
                word.as_str(),
                "then" | "else" | "do" | "begin" | "and" | "or" | "not"
            ),
            _ => false,
        }
    }

    /// Whether the `do` at `index` belongs to a `while`/`until`/`for` header
    /// on the same line.
    fn is_loop_do(&self, index: usize) -> bool {
        let mut i = index;
        while i > 0 {
            i -= 1;
            let token = self.token_at(i);
            if token.is_separator() || token.is_word("do") {
                return false;
            }
            if token.is_word("for") && !self.after_dot(i) {
                return true;
            }
            if (token.is_word("while") || token.is_word("until"))
                && !self.after_dot(i)
                && self.at_expression_start(i)
            {
                return true;
            }
        }
        false
    }

    fn opens_keyword_block(&self, index: usize) -> bool {
        let TokenKind::Ident(word) = &self.token_at(index).kind else {
            return false;
        };
        if self.after_dot(index) {
            return false;
        }
        match word.as_str() {
            "class" | "module" | "begin" | "case" | "for" => true,
            "def" => !self.def_is_endless(index),
            "do" => !self.is_loop_do(index),
            "if" | "unless" | "while" | "until" => self.at_expression_start(index),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class_paths(nodes: &[Node]) -> Vec<String> {
        let mut out = Vec::new();
        for node in nodes {
            if let Node::Class { path, .. } = node {
                out.push(path.join("::"));
            }
            let children: Vec<Node> = node.children().into_iter().cloned().collect();
            out.extend(class_paths(&children));
        }
        out
    }

    #[test]
    fn nested_modules_and_classes() {
        let nodes = parse(
            "module Api\n  module V1\n    class User < T::Struct\n      const :id, String\n    end\n  end\nend\n",
        )
        .unwrap();
        assert_eq!(class_paths(&nodes), vec!["User"]);
        let Node::Module { path, body, .. } = &nodes[0] else {
            panic!("expected module");
        };
        assert_eq!(path, &vec!["Api".to_string()]);
        assert_eq!(body.len(), 1);
    }

    #[test]
    fn superclass_tokens_are_kept() {
        let nodes = parse("class Color < T::Enum; end").unwrap();
        let Node::Class { superclass, .. } = &nodes[0] else {
            panic!("expected class");
        };
        let kinds: Vec<&TokenKind> = superclass.iter().map(|t| &t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                &TokenKind::Constant("T".to_string()),
                &TokenKind::ColonColon,
                &TokenKind::Constant("Enum".to_string())
            ]
        );
    }

    #[test]
    fn method_bodies_with_nested_ends_are_skipped() {
        let source = "class A\n  def go(x)\n    if x\n      [1].each do |y|\n        y\n      end\n    end\n    x.end\n  end\n  class B < T::Struct\n  end\nend\n";
        let nodes = parse(source).unwrap();
        assert_eq!(class_paths(&nodes), vec!["A", "B"]);
    }

    #[test]
    fn regexp_literals_in_method_bodies() {
        let source = "class A < T::Struct\n  const :name, String\n  def slug\n    name.gsub(/[^a-z']/, '-')\n  end\n  def loud?\n    name.match?(/ do /) && name =~ %r{if|end}\n  end\nend\nclass B\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["A", "B"]);
    }

    #[test]
    fn character_literals_in_method_bodies() {
        let source = "class A < T::Struct\n  def quoted?\n    name[0] == ?' && name[-1] == ?\"\n  end\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["A"]);
    }

    #[test]
    fn modifiers_do_not_open_blocks() {
        let source = "class A\n  x = 1 if true\n  y unless false\n  z while false\n  class B\n  end\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["A", "B"]);
    }

    #[test]
    fn loop_do_is_not_a_block() {
        let source = "while running do\n  step\nend\nclass A\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["A"]);
    }

    #[test]
    fn endless_method_has_no_end() {
        let source = "class A\n  def size = 3\n  def name() = 'a'\n  def value=(v)\n    @v = v\n  end\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["A"]);
    }

    #[test]
    fn do_blocks_are_parsed_recursively() {
        let source = "included do\n  class Inner < T::Struct\n  end\nend\n";
        assert_eq!(class_paths(&parse(source).unwrap()), vec!["Inner"]);
    }

    #[test]
    fn brace_block_attaches_to_statement() {
        let nodes = parse("Alias = T.type_alias { T::Hash[String, T.untyped] }\n").unwrap();
        let Node::Statement(statement) = &nodes[0] else {
            panic!("expected statement");
        };
        assert_eq!(statement.assigned_constant(), Some("Alias"));
        assert_eq!(statement.blocks.len(), 1);
        assert_eq!(statement.blocks[0].len(), 1);
    }

    #[test]
    fn hash_literal_is_not_a_block() {
        let nodes = parse("DEFAULTS = { a: 1, b: [2, 3] }\nclass A\nend\n").unwrap();
        let Node::Statement(statement) = &nodes[0] else {
            panic!("expected statement");
        };
        assert!(statement.blocks.is_empty());
        assert_eq!(class_paths(&nodes), vec!["A"]);
    }

    #[test]
    fn multi_line_arguments_join_one_statement() {
        let nodes = parse("const :tags,\n  T::Array[String]\n").unwrap();
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn singleton_class_body_is_a_node() {
        let nodes = parse("class A\n  class << self\n    def x; end\n  end\nend\n").unwrap();
        let Node::Class { body, .. } = &nodes[0] else {
            panic!("expected class");
        };
        assert!(matches!(body[0], Node::SingletonClass { .. }));
    }

    #[test]
    fn stray_end_is_an_error() {
        let err = parse("class A\nend\nend\n").unwrap_err();
        assert!(err.message.contains("unexpected `end`"));
        assert_eq!(err.line, 3);
    }

    #[test]
    fn unclosed_class_is_an_error() {
        let err = parse("class A < T::Struct\n  const :a, String\n").unwrap_err();
        assert!(err.message.contains("expected `end`"));
    }

    #[test]
    fn unclosed_paren_is_an_error() {
        assert!(parse("const :a, T.nilable(String\n").is_err());
    }

    #[test]
    fn lowercase_class_name_is_an_error() {
        assert!(parse("class foo\nend\n").is_err());
    }
}

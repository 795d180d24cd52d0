//! # Lexer
//!
//! Converts source text into a flat token stream for the structural parser.
//!
//! Only as much of the language is understood as is needed to find
//! declaration boundaries reliably: comments (`#` and `=begin`/`=end`),
//! string-like literals (quoted, heredoc, percent, regexp, `?c`
//! characters) so their contents can never be mistaken for code, symbols, labels, constant paths, and
//! operators. Everything after `__END__` is ignored.
//!
//! ## Errors
//!
//! Unterminated strings, heredocs, regexps, and block comments are syntax
//! errors and fail the whole unit.
//!
//! ## Ambiguity
//!
//! `/`, `%`, `<<`, and `?` are literal openers where an expression can
//! start and operators after a value. After a bare method name followed by
//! a space (`split /,/`), `/` opens a regexp only when the line closes it.

use crate::error::ParseError;
use crate::token::{is_keyword, Span, Token, TokenKind};

/// Operators, longest first so that matching is greedy.
const OPERATORS: &[&str] = &[
    "**=", "<=>", "===", "...", "<<=", ">>=", "&&=", "||=", "==", "!=", ">=", "<=", "&&", "||",
    "<<", ">>", "**", "=~", "!~", "=>", "->", "+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=",
    "&.", "..", "=", "<", ">", "+", "-", "*", "/", "%", "&", "|", "^", "!", "~", "?", ":",
];

/// Method names that may follow `:` to form an operator symbol.
const OPERATOR_SYMBOLS: &[&str] = &[
    "[]=", "[]", "<=>", "===", "==", "=~", "!=", "!~", "**", "<<", ">>", "<=", ">=", "+@", "-@",
    "+", "-", "*", "/", "%", "<", ">", "!", "&", "|", "^", "~",
];

/// A heredoc whose body starts on the next line.
struct PendingHeredoc {
    terminator: String,
    indented: bool,
    token_index: usize,
    span: Span,
}

/// Start position of the token being scanned.
#[derive(Clone, Copy)]
struct Mark {
    position: usize,
    line: u32,
    column: u32,
}

/// Lexer state.
pub struct Lexer<'src> {
    source: &'src str,
    rest: &'src str,
    position: usize,
    line: u32,
    column: u32,
    tokens: Vec<Token>,
    pending_heredocs: Vec<PendingHeredoc>,
}

impl<'src> Lexer<'src> {
    /// Creates a lexer over `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
            tokens: Vec::new(),
            pending_heredocs: Vec::new(),
        }
    }

    /// Tokenizes the whole input. The last token is always [`TokenKind::Eof`].
    pub fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        loop {
            let space_before = self.skip_blanks();
            let mark = self.mark();
            let Some(c) = self.peek_char() else {
                return self.finish(mark, space_before);
            };

            match c {
                '\n' => {
                    self.advance();
                    self.push(TokenKind::Newline, mark, space_before);
                    self.read_heredoc_bodies()?;
                }
                '#' => self.skip_line_comment(),
                '=' if self.column == 1 && self.rest.starts_with("=begin") => {
                    self.skip_block_comment(mark)?;
                }
                '_' if self.column == 1 && self.at_data_marker() => {
                    return self.finish(mark, space_before);
                }
                ';' => self.single(TokenKind::Semicolon, mark, space_before),
                ',' => self.single(TokenKind::Comma, mark, space_before),
                '(' => self.single(TokenKind::LParen, mark, space_before),
                ')' => self.single(TokenKind::RParen, mark, space_before),
                '[' => self.single(TokenKind::LBracket, mark, space_before),
                ']' => self.single(TokenKind::RBracket, mark, space_before),
                '{' => self.single(TokenKind::LBrace, mark, space_before),
                '}' => self.single(TokenKind::RBrace, mark, space_before),
                '.' if self.peek_char_n(1) != Some('.') => {
                    self.single(TokenKind::Dot, mark, space_before);
                }
                ':' => {
                    let kind = self.scan_colon(space_before)?;
                    self.push(kind, mark, space_before);
                }
                '"' | '\'' | '`' => {
                    let text = self.scan_quoted(c)?;
                    self.push(TokenKind::Str(text), mark, space_before);
                }
                '%' if self.percent_literal_ahead(space_before) => {
                    let text = self.scan_percent_literal(mark)?;
                    self.push(TokenKind::Str(text), mark, space_before);
                }
                '<' if self.heredoc_ahead() => self.scan_heredoc_start(mark, space_before),
                '/' if self.regexp_ahead(space_before) => {
                    let text = self.scan_regexp(mark)?;
                    self.push(TokenKind::Str(text), mark, space_before);
                }
                '?' if self.char_literal_ahead() => {
                    let text = self.scan_char_literal();
                    self.push(TokenKind::Str(text), mark, space_before);
                }
                '@' | '$' => {
                    let kind = self.scan_variable();
                    self.push(kind, mark, space_before);
                }
                c if c.is_ascii_digit() => {
                    let kind = self.scan_number();
                    self.push(kind, mark, space_before);
                }
                c if c.is_alphabetic() || c == '_' => {
                    let kind = self.scan_word();
                    self.push(kind, mark, space_before);
                }
                _ => {
                    let kind = self.scan_operator();
                    self.push(kind, mark, space_before);
                }
            }
        }
    }

    fn finish(mut self, mark: Mark, space_before: bool) -> Result<Vec<Token>, ParseError> {
        if let Some(pending) = self.pending_heredocs.first() {
            return Err(ParseError::at(
                pending.span,
                format!("unterminated heredoc, expected `{}`", pending.terminator),
            ));
        }
        self.push(TokenKind::Eof, mark, space_before);
        Ok(self.tokens)
    }

    fn mark(&self) -> Mark {
        Mark {
            position: self.position,
            line: self.line,
            column: self.column,
        }
    }

    fn span_from(&self, mark: Mark) -> Span {
        Span::new(mark.position, self.position, mark.line, mark.column)
    }

    fn push(&mut self, kind: TokenKind, mark: Mark, space_before: bool) {
        let span = self.span_from(mark);
        self.tokens.push(Token::new(kind, span, space_before));
    }

    fn single(&mut self, kind: TokenKind, mark: Mark, space_before: bool) {
        self.advance();
        self.push(kind, mark, space_before);
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn advance_bytes(&mut self, count: usize) {
        let target = self.position + count;
        while self.position < target && !self.rest.is_empty() {
            self.advance();
        }
    }

    /// Skips spaces, tabs, carriage returns, and backslash line
    /// continuations. Returns whether the next token is preceded by
    /// whitespace or starts a line.
    fn skip_blanks(&mut self) -> bool {
        let mut skipped = false;
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r') => {
                    self.advance();
                    skipped = true;
                }
                Some('\\') if matches!(self.peek_char_n(1), Some('\n')) => {
                    self.advance();
                    self.advance();
                    skipped = true;
                }
                Some('\\') if self.rest.starts_with("\\\r\n") => {
                    self.advance_bytes(3);
                    skipped = true;
                }
                _ => break,
            }
        }
        skipped
            || matches!(
                self.tokens.last().map(|t| &t.kind),
                None | Some(TokenKind::Newline)
            )
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.peek_char() {
            if c == '\n' {
                break;
            }
            self.advance();
        }
    }

    fn skip_block_comment(&mut self, mark: Mark) -> Result<(), ParseError> {
        loop {
            self.skip_line_comment();
            if self.peek_char().is_none() {
                return Err(ParseError::at(
                    self.span_from(mark),
                    "unterminated `=begin` comment",
                ));
            }
            self.advance();
            if self.rest.starts_with("=end") {
                self.skip_line_comment();
                return Ok(());
            }
        }
    }

    fn at_data_marker(&self) -> bool {
        self.rest
            .strip_prefix("__END__")
            .is_some_and(|after| after.is_empty() || after.starts_with('\n') || after.starts_with('\r'))
    }

    /// Whether the previous token ends a value, which makes a following
    /// `%`, `<<`, `/`, or `?` a binary operator.
    fn previous_is_value(&self) -> bool {
        match self.tokens.last().map(|t| &t.kind) {
            Some(TokenKind::Ident(word)) => {
                !is_keyword(word) || matches!(word.as_str(), "self" | "nil" | "true" | "false")
            }
            Some(
                TokenKind::Constant(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::Symbol(_)
                | TokenKind::RParen
                | TokenKind::RBracket
                | TokenKind::RBrace,
            ) => true,
            _ => false,
        }
    }

    fn scan_colon(&mut self, space_before: bool) -> Result<TokenKind, ParseError> {
        match self.peek_char_n(1) {
            Some(':') => {
                self.advance();
                self.advance();
                Ok(TokenKind::ColonColon)
            }
            Some(quote @ ('"' | '\'')) => {
                self.advance();
                let text = self.scan_quoted(quote)?;
                Ok(TokenKind::Symbol(text))
            }
            Some(c) if c.is_alphabetic() || c == '_' || c == '@' || c == '$' => {
                self.advance();
                let start = self.position;
                while matches!(self.peek_char(), Some('@' | '$')) {
                    self.advance();
                }
                self.consume_word_chars();
                if matches!(self.peek_char(), Some('?' | '!'))
                    || (self.peek_char() == Some('=')
                        && !matches!(self.peek_char_n(1), Some('=' | '>' | '~')))
                {
                    self.advance();
                }
                Ok(TokenKind::Symbol(self.source[start..self.position].to_string()))
            }
            _ => {
                let after = &self.rest[1..];
                let operator = OPERATOR_SYMBOLS
                    .iter()
                    .find(|op| after.starts_with(**op))
                    .filter(|_| space_before || !self.previous_is_value());
                self.advance();
                match operator {
                    Some(op) => {
                        self.advance_bytes(op.len());
                        Ok(TokenKind::Symbol((*op).to_string()))
                    }
                    None => Ok(TokenKind::Op(":".to_string())),
                }
            }
        }
    }

    /// Scans a quoted literal starting at its opening quote and returns its
    /// raw contents. Interpolations are skipped, not evaluated.
    fn scan_quoted(&mut self, quote: char) -> Result<String, ParseError> {
        let mark = self.mark();
        self.advance();
        let interpolates = quote != '\'';
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::at(
                        self.span_from(mark),
                        "unterminated string literal",
                    ));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.peek_char() {
                        text.push(c);
                        self.advance();
                    }
                }
                Some(c) if c == quote => {
                    self.advance();
                    return Ok(text);
                }
                Some('#') if interpolates && self.peek_char_n(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    self.skip_interpolation(mark)?;
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn skip_interpolation(&mut self, mark: Mark) -> Result<(), ParseError> {
        let mut depth = 1usize;
        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::at(
                        self.span_from(mark),
                        "unterminated string interpolation",
                    ));
                }
                Some('{') => {
                    depth += 1;
                    self.advance();
                }
                Some('}') => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(quote @ ('"' | '\'' | '`')) => {
                    self.scan_quoted(quote)?;
                }
                Some(_) => self.advance(),
            }
        }
    }

    fn percent_literal_ahead(&self, space_before: bool) -> bool {
        let (typed, delimiter) = match self.peek_char_n(1) {
            Some(c) if "qQwWiIrsx".contains(c) => (true, self.peek_char_n(2)),
            other => (false, other),
        };
        let Some(delimiter) = delimiter else {
            return false;
        };
        let valid = if typed {
            !delimiter.is_alphanumeric() && !delimiter.is_whitespace()
        } else {
            "([{<|!/".contains(delimiter)
        };
        valid && (!self.previous_is_value() || space_before && !delimiter.is_whitespace())
    }

    fn scan_percent_literal(&mut self, mark: Mark) -> Result<String, ParseError> {
        self.advance();
        if self.peek_char().is_some_and(|c| c.is_alphabetic()) {
            self.advance();
        }
        let Some(open) = self.peek_char() else {
            return Err(ParseError::at(self.span_from(mark), "unterminated percent literal"));
        };
        let close = match open {
            '(' => ')',
            '[' => ']',
            '{' => '}',
            '<' => '>',
            c => c,
        };
        self.advance();

        let mut depth = 1usize;
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::at(
                        self.span_from(mark),
                        "unterminated percent literal",
                    ));
                }
                Some('\\') => {
                    self.advance();
                    if let Some(c) = self.peek_char() {
                        text.push(c);
                        self.advance();
                    }
                }
                Some(c) if c == close => {
                    self.advance();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                    text.push(c);
                }
                Some(c) if c == open => {
                    self.advance();
                    depth += 1;
                    text.push(c);
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
    }

    fn regexp_ahead(&self, space_before: bool) -> bool {
        let Some(next) = self.peek_char_n(1) else {
            return false;
        };
        if !self.previous_is_value() {
            return true;
        }
        let after_command = matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Ident(word)) if !is_keyword(word)
        );
        after_command
            && space_before
            && !next.is_whitespace()
            && next != '='
            && self.closes_on_this_line()
    }

    /// Whether an unescaped `/` follows the current one before the line ends.
    fn closes_on_this_line(&self) -> bool {
        let mut chars = self.rest.chars().skip(1);
        while let Some(c) = chars.next() {
            match c {
                '\\' => {
                    chars.next();
                }
                '/' => return true,
                '\n' => return false,
                _ => {}
            }
        }
        false
    }

    /// Scans `/.../flags` and returns the pattern source.
    fn scan_regexp(&mut self, mark: Mark) -> Result<String, ParseError> {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                None => {
                    return Err(ParseError::at(self.span_from(mark), "unterminated regexp"));
                }
                Some('\\') => {
                    text.push('\\');
                    self.advance();
                    if let Some(c) = self.peek_char() {
                        text.push(c);
                        self.advance();
                    }
                }
                Some('/') => {
                    self.advance();
                    break;
                }
                Some('#') if self.peek_char_n(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    self.skip_interpolation(mark)?;
                }
                Some(c) => {
                    text.push(c);
                    self.advance();
                }
            }
        }
        while self.peek_char().is_some_and(|c| "imxounse".contains(c)) {
            self.advance();
        }
        Ok(text)
    }

    /// `?a`, `?'`, or `?\n` where an expression can start. `?ab` is not a
    /// character literal.
    fn char_literal_ahead(&self) -> bool {
        if self.previous_is_value() {
            return false;
        }
        match self.peek_char_n(1) {
            Some('\\') => self.peek_char_n(2).is_some(),
            Some(c) if !c.is_whitespace() => !self
                .peek_char_n(2)
                .is_some_and(|d| d.is_alphanumeric() || d == '_'),
            _ => false,
        }
    }

    fn scan_char_literal(&mut self) -> String {
        self.advance();
        let mut text = String::new();
        if self.peek_char() == Some('\\') {
            self.advance();
            let escaped = self.peek_char();
            self.advance();
            if let Some(c) = escaped {
                text.push(c);
            }
            if escaped == Some('u') {
                while self
                    .peek_char()
                    .is_some_and(|c| c.is_ascii_hexdigit() || c == '{' || c == '}')
                {
                    self.advance();
                }
            }
        } else if let Some(c) = self.peek_char() {
            text.push(c);
            self.advance();
        }
        text
    }

    /// `<<~ID`, `<<-ID`, or `<<ID` with an upper-case or quoted identifier
    /// directly after the operator.
    fn heredoc_ahead(&self) -> bool {
        let (after, explicit) = if self.rest.starts_with("<<~") || self.rest.starts_with("<<-") {
            (&self.rest[3..], true)
        } else if self.rest.starts_with("<<") {
            (&self.rest[2..], false)
        } else {
            return false;
        };
        let names_terminator = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase() || c == '_' || c == '\'' || c == '"' || c == '`');
        names_terminator && (explicit || !self.previous_is_value())
    }

    fn scan_heredoc_start(&mut self, mark: Mark, space_before: bool) {
        self.advance();
        self.advance();
        let indented = matches!(self.peek_char(), Some('~' | '-'));
        if indented {
            self.advance();
        }
        let terminator = match self.peek_char() {
            Some(quote @ ('\'' | '"' | '`')) => {
                self.advance();
                let start = self.position;
                while self.peek_char().is_some_and(|c| c != quote && c != '\n') {
                    self.advance();
                }
                let text = self.source[start..self.position].to_string();
                if self.peek_char() == Some(quote) {
                    self.advance();
                }
                text
            }
            _ => {
                let start = self.position;
                self.consume_word_chars();
                self.source[start..self.position].to_string()
            }
        };

        let span = self.span_from(mark);
        self.pending_heredocs.push(PendingHeredoc {
            terminator,
            indented,
            token_index: self.tokens.len(),
            span,
        });
        self.push(TokenKind::Str(String::new()), mark, space_before);
    }

    /// Consumes the bodies of heredocs opened on the line just ended.
    fn read_heredoc_bodies(&mut self) -> Result<(), ParseError> {
        let pending = std::mem::take(&mut self.pending_heredocs);
        for doc in pending {
            let mut body = String::new();
            loop {
                if self.rest.is_empty() {
                    return Err(ParseError::at(
                        doc.span,
                        format!("unterminated heredoc, expected `{}`", doc.terminator),
                    ));
                }
                let line_len = self.rest.find('\n').map_or(self.rest.len(), |i| i + 1);
                let line = &self.rest[..line_len];
                let content = line.trim_end_matches(['\n', '\r']);
                let is_end = if doc.indented {
                    content.trim() == doc.terminator
                } else {
                    content == doc.terminator
                };
                if !is_end {
                    body.push_str(line);
                }
                self.advance_bytes(line_len);
                if is_end {
                    break;
                }
            }
            if let Some(token) = self.tokens.get_mut(doc.token_index) {
                token.kind = TokenKind::Str(body);
            }
        }
        Ok(())
    }

    fn consume_word_chars(&mut self) {
        while self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
    }

    fn scan_variable(&mut self) -> TokenKind {
        let start = self.position;
        self.advance();
        if self.peek_char() == Some('@') {
            self.advance();
        }
        if self
            .peek_char()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.consume_word_chars();
        } else if self.source[start..self.position].starts_with('$') {
            // Special globals such as `$!` and `$0`.
            self.advance();
        }
        TokenKind::Ident(self.source[start..self.position].to_string())
    }

    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        if self.peek_char() == Some('0') && matches!(self.peek_char_n(1), Some('x' | 'X' | 'b' | 'B' | 'o' | 'O')) {
            self.advance();
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_hexdigit() || c == '_') {
                self.advance();
            }
            return TokenKind::Number(self.source[start..self.position].to_string());
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() || c == '_' {
                self.advance();
            } else if c == '.' && self.peek_char_n(1).is_some_and(|d| d.is_ascii_digit()) {
                self.advance();
            } else if matches!(c, 'e' | 'E')
                && self
                    .peek_char_n(1)
                    .is_some_and(|d| d.is_ascii_digit() || d == '-' || d == '+')
            {
                self.advance();
                self.advance();
            } else {
                break;
            }
        }
        if matches!(self.peek_char(), Some('r' | 'i'))
            && !self.peek_char_n(1).is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }
        TokenKind::Number(self.source[start..self.position].to_string())
    }

    fn scan_word(&mut self) -> TokenKind {
        let start = self.position;
        let constant = self.peek_char().is_some_and(char::is_uppercase);
        self.consume_word_chars();
        if !constant
            && matches!(self.peek_char(), Some('?' | '!'))
            && !matches!(self.peek_char_n(1), Some('='))
        {
            self.advance();
        }
        let text = self.source[start..self.position].to_string();

        let after_dot = matches!(
            self.tokens.last().map(|t| &t.kind),
            Some(TokenKind::Dot)
        );
        if self.peek_char() == Some(':') && self.peek_char_n(1) != Some(':') && !after_dot {
            self.advance();
            return TokenKind::Label(text);
        }

        if constant {
            TokenKind::Constant(text)
        } else {
            TokenKind::Ident(text)
        }
    }

    fn scan_operator(&mut self) -> TokenKind {
        if let Some(op) = OPERATORS.iter().find(|op| self.rest.starts_with(**op)) {
            self.advance_bytes(op.len());
            return TokenKind::Op((*op).to_string());
        }
        let start = self.position;
        self.advance();
        TokenKind::Op(self.source[start..self.position].to_string())
    }
}

/// Tokenizes `source`.
pub fn tokenize(source: &str) -> Result<Vec<Token>, ParseError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn constant(s: &str) -> TokenKind {
        TokenKind::Constant(s.to_string())
    }

    fn ident(s: &str) -> TokenKind {
        TokenKind::Ident(s.to_string())
    }

    #[test]
    fn class_header() {
        assert_eq!(
            kinds("class Foo < T::Struct\n"),
            vec![
                ident("class"),
                constant("Foo"),
                TokenKind::Op("<".to_string()),
                constant("T"),
                TokenKind::ColonColon,
                constant("Struct"),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn prop_with_symbol_and_label() {
        assert_eq!(
            kinds("const :name, String, default: 'x'"),
            vec![
                ident("const"),
                TokenKind::Symbol("name".to_string()),
                TokenKind::Comma,
                constant("String"),
                TokenKind::Comma,
                TokenKind::Label("default".to_string()),
                TokenKind::Str("x".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        let source = "# class Hidden < T::Struct\n=begin\nclass AlsoHidden\n=end\nFoo";
        let tokens = kinds(source);
        assert!(!tokens.contains(&constant("Hidden")));
        assert!(!tokens.contains(&constant("AlsoHidden")));
        assert!(tokens.contains(&constant("Foo")));
    }

    #[test]
    fn strings_hide_keywords() {
        let tokens = kinds("x = \"end #{1 + {a: 1}[:a]} class\"\n");
        assert!(!tokens.contains(&ident("end")));
        assert!(!tokens.contains(&ident("class")));
    }

    #[test]
    fn heredoc_body_is_one_string() {
        let source = "x = <<~SQL\n  select end\n  from class\nSQL\nFoo\n";
        let tokens = kinds(source);
        assert!(!tokens.contains(&ident("end")));
        assert!(tokens.contains(&constant("Foo")));
        assert!(tokens
            .iter()
            .any(|t| matches!(t, TokenKind::Str(s) if s.contains("select end"))));
    }

    #[test]
    fn percent_words_are_one_literal() {
        let tokens = kinds("X = %w[end class module]\n");
        assert!(!tokens.contains(&ident("end")));
    }

    #[test]
    fn modulo_is_an_operator() {
        let tokens = kinds("a % b");
        assert!(tokens.contains(&TokenKind::Op("%".to_string())));
    }

    #[test]
    fn method_name_after_dot_is_not_a_label() {
        let tokens = kinds("x ? y.size: 0");
        assert!(tokens.contains(&ident("size")));
    }

    #[test]
    fn index_has_no_space_before() {
        let tokens = tokenize("T::Array[String]").unwrap();
        let bracket = tokens
            .iter()
            .find(|t| t.kind == TokenKind::LBracket)
            .unwrap();
        assert!(!bracket.space_before);
    }

    #[test]
    fn data_section_is_ignored() {
        let tokens = kinds("Foo\n__END__\nclass Broken\n");
        assert!(!tokens.contains(&ident("class")));
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("const :name, \"oops\n").unwrap_err();
        assert!(err.message.contains("unterminated string"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn unterminated_heredoc_is_an_error() {
        assert!(tokenize("x = <<~EOS\nbody\n").is_err());
    }

    #[test]
    fn regexp_contents_are_one_literal() {
        let tokens = kinds("name.gsub(/[^a-z' do]/i, '-')\n");
        assert!(!tokens.contains(&ident("do")));
        assert!(tokens.contains(&TokenKind::Str("[^a-z' do]".to_string())));
        assert!(tokens.contains(&TokenKind::Str("-".to_string())));
    }

    #[test]
    fn regexp_after_command_needs_a_closing_slash() {
        let tokens = kinds("parts = line.split /,/\ntotal = count /2\n");
        assert!(tokens.contains(&TokenKind::Str(",".to_string())));
        assert!(tokens.contains(&TokenKind::Op("/".to_string())));
    }

    #[test]
    fn division_stays_an_operator() {
        let tokens = kinds("a / b + c/d + (e) / 2\n");
        let slashes = tokens
            .iter()
            .filter(|t| **t == TokenKind::Op("/".to_string()))
            .count();
        assert_eq!(slashes, 3);
    }

    #[test]
    fn percent_regexp_is_one_literal() {
        let tokens = kinds("x = %r{end/class}\n");
        assert!(!tokens.contains(&ident("end")));
    }

    #[test]
    fn character_literals() {
        let tokens = kinds("name[0] == ?' || c == ?\\n\n");
        assert!(tokens.contains(&TokenKind::Str("'".to_string())));
        assert!(tokens.contains(&TokenKind::Str("n".to_string())));
        let ternary = kinds("ok ? 'a' : 'b'\n");
        assert!(ternary.contains(&TokenKind::Op("?".to_string())));
    }

    #[test]
    fn unterminated_regexp_is_an_error() {
        let err = tokenize("x = /abc\n").unwrap_err();
        assert!(err.message.contains("unterminated regexp"));
    }

    #[test]
    fn spans_track_lines() {
        let tokens = tokenize("module A\n  class B\n").unwrap();
        let b = tokens.iter().find(|t| t.kind == constant("B")).unwrap();
        assert_eq!((b.span.line, b.span.column), (2, 9));
    }
}

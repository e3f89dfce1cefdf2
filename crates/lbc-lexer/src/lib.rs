//! Byte-cursor lexer for LightBASIC source text.
//!
//! Scans one token at a time via [`Lexer::next`], with a non-destructive
//! [`Lexer::peek`]. Newlines (and the inline `:` statement separator) only
//! produce an `EndOfStmt` token when a statement is actually pending — this
//! is tracked by the `has_statement` flag, set by every productive token
//! and cleared once an `EndOfStmt` is emitted.

pub mod cursor;

use cursor::Cursor;
use lbc_common::{Diagnostic, DiagnosticEngine, LiteralValue, Span, StringInterner, Token, TokenKind};

pub struct Lexer<'src, 'ctx> {
    cursor: Cursor<'src>,
    has_statement: bool,
    peeked: Option<Token>,
    interner: &'ctx mut StringInterner,
    diagnostics: &'ctx mut DiagnosticEngine,
}

impl<'src, 'ctx> Lexer<'src, 'ctx> {
    pub fn new(
        source: &'src str,
        interner: &'ctx mut StringInterner,
        diagnostics: &'ctx mut DiagnosticEngine,
    ) -> Self {
        Lexer {
            cursor: Cursor::new(source),
            has_statement: false,
            peeked: None,
            interner,
            diagnostics,
        }
    }

    /// Lex the whole buffer into a vector, for callers that don't need
    /// streaming (tests, the one-shot driver).
    pub fn tokenize(
        source: &'src str,
        interner: &'ctx mut StringInterner,
        diagnostics: &'ctx mut DiagnosticEngine,
    ) -> Vec<Token> {
        let mut lexer = Lexer::new(source, interner, diagnostics);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next();
            let is_eof = tok.kind == TokenKind::EndOfFile;
            out.push(tok);
            if is_eof {
                break;
            }
        }
        out
    }

    pub fn peek(&mut self) -> Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token());
        }
        self.peeked.unwrap()
    }

    pub fn next(&mut self) -> Token {
        if let Some(tok) = self.peeked.take() {
            return tok;
        }
        self.scan_token()
    }

    /// Exposes the shared diagnostic sink so a parser built on top of this
    /// lexer can report its own errors without opening a second mutable
    /// borrow of the engine.
    pub fn diagnostics(&mut self) -> &mut DiagnosticEngine {
        self.diagnostics
    }

    /// Exposes the shared string interner for the same reason.
    pub fn interner(&mut self) -> &mut StringInterner {
        self.interner
    }

    fn emit(&mut self, kind: TokenKind, start: u32) -> Token {
        let span = Span::new(start, self.cursor.pos());
        if kind != TokenKind::EndOfStmt {
            self.has_statement = true;
        }
        Token::new(kind, span)
    }

    fn emit_value(&mut self, kind: TokenKind, start: u32, value: LiteralValue) -> Token {
        let span = Span::new(start, self.cursor.pos());
        self.has_statement = true;
        Token::with_value(kind, span, value)
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics.report(Diagnostic::error(span, message));
    }

    fn scan_token(&mut self) -> Token {
        loop {
            let start = self.cursor.pos();
            let Some(c) = self.cursor.peek() else {
                return self.end_of_buffer(start);
            };

            match c {
                ' ' | '\t' => {
                    self.cursor.advance();
                    continue;
                }
                '\r' => {
                    self.cursor.advance();
                    if self.cursor.peek() == Some('\n') {
                        self.cursor.advance();
                    }
                    return self.newline_token(start);
                }
                '\n' => {
                    self.cursor.advance();
                    return self.newline_token(start);
                }
                ':' => {
                    self.cursor.advance();
                    return self.newline_token(start);
                }
                '\'' => {
                    self.skip_line_comment();
                    continue;
                }
                '/' if self.cursor.peek_next() == Some('\'') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    self.skip_block_comment();
                    continue;
                }
                '"' => return self.lex_string(start),
                '0'..='9' => return self.lex_number(start, false),
                c if is_ident_start(c) => return self.lex_ident_or_continuation(start),
                _ => return self.lex_symbol_or_operator(start, c),
            }
        }
    }

    fn end_of_buffer(&mut self, start: u32) -> Token {
        if self.has_statement {
            self.has_statement = false;
            Token::new(TokenKind::EndOfStmt, Span::new(start, start))
        } else {
            Token::new(TokenKind::EndOfFile, Span::new(start, start))
        }
    }

    fn newline_token(&mut self, start: u32) -> Token {
        let span = Span::new(start, self.cursor.pos());
        if self.has_statement {
            self.has_statement = false;
            Token::new(TokenKind::EndOfStmt, span)
        } else {
            // Recurse: a silent newline produces no token of its own.
            self.scan_token()
        }
    }

    fn skip_line_comment(&mut self) {
        self.cursor.advance(); // '
        self.cursor.eat_while(|c| c != '\n' && c != '\r');
    }

    fn skip_block_comment(&mut self) {
        let mut depth = 1u32;
        while depth > 0 {
            match self.cursor.peek() {
                None => break, // unclosed: silently terminated by EOF
                Some('/') if self.cursor.peek_next() == Some('\'') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth += 1;
                }
                Some('\'') if self.cursor.peek_next() == Some('/') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    depth -= 1;
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn lex_ident_or_continuation(&mut self, start: u32) -> Token {
        let first = self.cursor.peek().unwrap();
        if first == '_' {
            match self.cursor.peek_next() {
                Some('\n') | Some('\r') => {
                    // Line continuation: consume `_` and the newline silently.
                    self.cursor.advance(); // _
                    self.cursor.advance(); // \r or \n
                    if self.cursor.peek() == Some('\n') {
                        // was \r, check for \r\n
                        let before = self.cursor.pos();
                        self.cursor.advance();
                        let _ = before;
                    }
                    return self.scan_token();
                }
                _ => {}
            }
        }

        self.cursor.eat_while(is_ident_continue);
        let end = self.cursor.pos();
        let text = self.cursor.slice(start, end);
        let upper = text.to_ascii_uppercase();

        if let Some(kind) = lbc_common::token::keyword_from_str(&upper) {
            return match kind {
                TokenKind::True => self.emit_value(kind, start, LiteralValue::Bool(true)),
                TokenKind::False => self.emit_value(kind, start, LiteralValue::Bool(false)),
                TokenKind::Null => self.emit_value(kind, start, LiteralValue::Null),
                _ => self.emit(kind, start),
            };
        }

        let id = self.interner.intern(&upper);
        self.emit_value(TokenKind::Identifier, start, LiteralValue::Str(id))
    }

    fn lex_string(&mut self, start: u32) -> Token {
        self.cursor.advance(); // opening "
        let content_start = self.cursor.pos();
        loop {
            match self.cursor.peek() {
                None | Some('\n') | Some('\r') => {
                    let span = Span::new(start, self.cursor.pos());
                    self.error(span, "unterminated string literal");
                    return self.emit(TokenKind::Invalid, start);
                }
                Some('"') => {
                    let content_end = self.cursor.pos();
                    let raw = self.cursor.slice(content_start, content_end).to_owned();
                    self.cursor.advance(); // closing "
                    let id = self.interner.intern(&raw);
                    return self.emit_value(TokenKind::StringLiteral, start, LiteralValue::Str(id));
                }
                Some('\\') => {
                    let esc_start = self.cursor.pos();
                    self.cursor.advance();
                    match self.cursor.peek() {
                        Some(e) if is_valid_escape(e) => {
                            self.cursor.advance();
                        }
                        Some(_) => {
                            self.cursor.advance();
                            let span = Span::new(esc_start, self.cursor.pos());
                            self.error(span, "invalid escape sequence in string literal");
                        }
                        None => {
                            let span = Span::new(start, self.cursor.pos());
                            self.error(span, "unterminated string literal");
                            return self.emit(TokenKind::Invalid, start);
                        }
                    }
                }
                Some(c) if (c as u32) < 0x20 => {
                    let span = Span::at(self.cursor.pos());
                    self.error(span, "unescaped control character in string literal");
                    self.cursor.advance();
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    fn lex_number(&mut self, start: u32, mut is_float: bool) -> Token {
        if !is_float {
            self.cursor.eat_while(|c| c.is_ascii_digit());
            if self.cursor.peek() == Some('.') && matches!(self.cursor.peek_next(), Some(d) if d.is_ascii_digit())
            {
                is_float = true;
                self.cursor.advance(); // .
                self.cursor.eat_while(|c| c.is_ascii_digit());
            }
        } else {
            // Leading-dot float: caller already consumed the '.'.
            self.cursor.eat_while(|c| c.is_ascii_digit());
        }

        if matches!(self.cursor.peek(), Some(c) if c.is_alphabetic() || c == '_') {
            let bad_start = self.cursor.pos();
            self.cursor.eat_while(is_ident_continue);
            let span = Span::new(start, self.cursor.pos());
            self.error(span, "invalid trailing characters in numeric literal");
            let _ = bad_start;
            return self.emit(TokenKind::Invalid, start);
        }

        let text = self.cursor.slice(start, self.cursor.pos());
        if is_float {
            let value: f64 = text.parse().unwrap_or(0.0);
            self.emit_value(TokenKind::FloatingPointLiteral, start, LiteralValue::Float(value))
        } else {
            let value: u64 = text.parse().unwrap_or(0);
            self.emit_value(TokenKind::IntegerLiteral, start, LiteralValue::Integral(value))
        }
    }

    fn lex_symbol_or_operator(&mut self, start: u32, c: char) -> Token {
        self.cursor.advance();
        use TokenKind::*;
        match c {
            '(' => self.emit(ParenOpen, start),
            ')' => self.emit(ParenClose, start),
            '[' => self.emit(BracketOpen, start),
            ']' => self.emit(BracketClose, start),
            ',' => self.emit(Comma, start),
            '@' => self.emit(AddressOf, start),
            '+' => self.emit(Plus, start),
            '*' => self.emit(Multiply, start),
            '.' => self.lex_dot(start),
            '-' => {
                if self.cursor.peek() == Some('>') {
                    self.cursor.advance();
                    self.emit(PointerAccess, start)
                } else {
                    self.emit(Minus, start)
                }
            }
            '=' => {
                if self.cursor.peek() == Some('>') {
                    self.cursor.advance();
                    self.emit(LambdaBody, start)
                } else {
                    self.emit(Assign, start)
                }
            }
            '<' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.emit(LessOrEqual, start)
                } else if self.cursor.peek() == Some('>') {
                    self.cursor.advance();
                    self.emit(NotEqual, start)
                } else {
                    self.emit(LessThan, start)
                }
            }
            '>' => {
                if self.cursor.peek() == Some('=') {
                    self.cursor.advance();
                    self.emit(GreaterOrEqual, start)
                } else {
                    self.emit(GreaterThan, start)
                }
            }
            _ => {
                let span = Span::new(start, self.cursor.pos());
                self.error(span, format!("unexpected character '{c}'"));
                self.emit(Invalid, start)
            }
        }
    }

    fn lex_dot(&mut self, start: u32) -> Token {
        if matches!(self.cursor.peek(), Some(d) if d.is_ascii_digit()) {
            return self.lex_number(start, true);
        }
        if self.cursor.peek() == Some('.') {
            self.cursor.advance();
            if self.cursor.peek() == Some('.') {
                self.cursor.advance();
                return self.emit(TokenKind::Ellipsis, start);
            }
            let span = Span::new(start, self.cursor.pos());
            self.error(span, "'..' is not a valid token (did you mean '...'?)");
            return self.emit(TokenKind::Invalid, start);
        }
        self.emit(TokenKind::MemberAccess, start)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_valid_escape(c: char) -> bool {
    matches!(c, 'a' | 'b' | 'f' | 'n' | 'r' | 't' | 'v' | '\\' | '\'' | '"' | '0')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> (Vec<Token>, DiagnosticEngine) {
        let mut interner = StringInterner::new();
        let mut diagnostics = DiagnosticEngine::new();
        let tokens = Lexer::tokenize(source, &mut interner, &mut diagnostics);
        (tokens, diagnostics)
    }

    #[test]
    fn keywords_are_case_insensitive() {
        for spelling in ["DIM", "dim", "Dim", "dIm"] {
            let (tokens, _) = lex_all(spelling);
            assert_eq!(tokens[0].kind, TokenKind::Dim, "{spelling}");
        }
    }

    #[test]
    fn comments_are_inert() {
        let (tokens, _) = lex_all("' a comment\n42");
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[0].value.unwrap().as_integral(), Some(42));
    }

    #[test]
    fn nested_block_comments() {
        let (tokens, _) = lex_all("/' a /' b '/ c '/ 42");
        assert_eq!(tokens[0].kind, TokenKind::IntegerLiteral);
        assert_eq!(tokens[0].value.unwrap().as_integral(), Some(42));
    }

    #[test]
    fn peek_then_next_agree() {
        let mut interner = StringInterner::new();
        let mut diagnostics = DiagnosticEngine::new();
        let mut lexer = Lexer::new("DIM x", &mut interner, &mut diagnostics);
        let peeked = lexer.peek();
        let next = lexer.next();
        assert_eq!(peeked.kind, next.kind);
    }

    #[test]
    fn line_continuation_suppresses_end_of_stmt() {
        let (tokens, _) = lex_all("42 _\n+ 43");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntegerLiteral,
                TokenKind::Plus,
                TokenKind::IntegerLiteral,
                TokenKind::EndOfStmt,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn unclosed_string_is_invalid_and_diagnosed() {
        let (tokens, diagnostics) = lex_all("\"abc");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn colon_separates_statements_like_newline() {
        let (tokens, _) = lex_all("DIM x : DIM y");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Dim,
                TokenKind::Identifier,
                TokenKind::EndOfStmt,
                TokenKind::Dim,
                TokenKind::Identifier,
                TokenKind::EndOfStmt,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn float_with_leading_dot() {
        let (tokens, _) = lex_all(".5");
        assert_eq!(tokens[0].kind, TokenKind::FloatingPointLiteral);
        assert_eq!(tokens[0].value.unwrap().as_float(), Some(0.5));
    }

    #[test]
    fn ellipsis_and_double_dot() {
        let (tokens, diagnostics) = lex_all("...");
        assert_eq!(tokens[0].kind, TokenKind::Ellipsis);
        assert!(!diagnostics.has_errors());

        let (tokens, diagnostics) = lex_all("..");
        assert_eq!(tokens[0].kind, TokenKind::Invalid);
        assert!(diagnostics.has_errors());
    }

    #[test]
    fn true_false_null_carry_literal_payload() {
        let (tokens, _) = lex_all("TRUE FALSE NULL");
        assert_eq!(tokens[0].kind, TokenKind::True);
        assert_eq!(tokens[0].value.unwrap().as_bool(), Some(true));
        assert_eq!(tokens[1].kind, TokenKind::False);
        assert_eq!(tokens[1].value.unwrap().as_bool(), Some(false));
        assert_eq!(tokens[2].kind, TokenKind::Null);
        assert!(tokens[2].value.unwrap().is_null());
    }
}

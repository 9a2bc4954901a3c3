//! Main lexer implementation for type expressions.
//!
//! The [`Lexer`] converts a type expression into a stream of [`Token`]s.
//! `>>` is always two tokens, so nested template lists close naturally.

use serbridge_core::Span;

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for type expressions with one token of lookahead.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// Lookahead buffer for peeking.
    lookahead: Option<Token<'src>>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            lookahead: None,
        }
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if let Some(token) = self.lookahead.take() {
            return token;
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it.
    pub fn peek(&mut self) -> Token<'src> {
        match self.lookahead {
            Some(token) => token,
            None => {
                let token = self.scan_token();
                self.lookahead = Some(token);
                token
            }
        }
    }

    /// Consume the next token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.peek().kind == kind {
            Some(self.next_token())
        } else {
            None
        }
    }

    fn scan_token(&mut self) -> Token<'src> {
        while self.cursor.check(char::is_whitespace) {
            self.cursor.advance();
        }

        let line = self.cursor.line();
        let col = self.cursor.column();
        let start = self.cursor.offset();

        let Some(c) = self.cursor.peek() else {
            return Token::new(TokenKind::Eof, "", Span::point(line, col), start);
        };

        let kind = if is_ident_start(c) {
            let ident = self.cursor.eat_while(is_ident_continue);
            lookup_keyword(ident).unwrap_or(TokenKind::Identifier)
        } else {
            self.cursor.advance();
            match c {
                '?' => TokenKind::Question,
                '<' => TokenKind::Less,
                '>' => TokenKind::Greater,
                ',' => TokenKind::Comma,
                '.' => TokenKind::Dot,
                '&' => TokenKind::Amp,
                '[' => TokenKind::LeftBracket,
                ']' => TokenKind::RightBracket,
                _ => TokenKind::Error,
            }
        };

        let lexeme = self.cursor.slice_from(start);
        Token::new(kind, lexeme, Span::new(line, col, lexeme.len() as u32), start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token<'src>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            None
        } else {
            Some(token)
        }
    }
}

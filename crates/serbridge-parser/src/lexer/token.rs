//! Token types for the type expression lexer.

use serbridge_core::Span;
use std::fmt;

/// A token from a type expression.
///
/// Lexemes borrow from the source; `offset` is the byte offset of the token
/// start, used to report the unparsed remainder on errors.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    /// The type of token.
    pub kind: TokenKind,
    /// The source text of this token.
    pub lexeme: &'src str,
    /// Location in source.
    pub span: Span,
    /// Byte offset of the token start.
    pub offset: u32,
}

impl<'src> Token<'src> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span, offset: u32) -> Self {
        Self {
            kind,
            lexeme,
            span,
            offset,
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All token types of the type expression grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier segment of a (qualified) name.
    Identifier,

    // Keywords
    /// `const`
    Const,
    /// `this`
    This,
    /// `extends`
    Extends,
    /// `super`
    Super,

    // Punctuation
    /// `?`
    Question,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `&`
    Amp,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,

    /// A character outside the grammar.
    Error,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Human-readable description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::Identifier => "identifier",
            TokenKind::Const => "'const'",
            TokenKind::This => "'this'",
            TokenKind::Extends => "'extends'",
            TokenKind::Super => "'super'",
            TokenKind::Question => "'?'",
            TokenKind::Less => "'<'",
            TokenKind::Greater => "'>'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::Amp => "'&'",
            TokenKind::LeftBracket => "'['",
            TokenKind::RightBracket => "']'",
            TokenKind::Error => "invalid character",
            TokenKind::Eof => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Look up a keyword by its identifier text.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "const" => TokenKind::Const,
        "this" => TokenKind::This,
        "extends" => TokenKind::Extends,
        "super" => TokenKind::Super,
        _ => return None,
    })
}

/// Character-level scanner over a type expression.
///
/// Positions are byte offsets. Lines start at 1, and so do columns, which
/// count bytes from the start of the current line.
pub struct Cursor<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    line_start: usize,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            line: 1,
            line_start: 0,
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.pos as u32
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        (self.pos - self.line_start + 1) as u32
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Step over one character.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.line_start = self.pos;
        }
        Some(ch)
    }

    /// Step over the longest run matching `f` and return it.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        while self.check(&f) {
            self.advance();
        }
        &self.source[start..self.pos]
    }

    /// Text from byte offset `start` up to the current position.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.pos]
    }
}

/// Java identifiers may contain `$` (nested class binary names).
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '_' | '$')
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$')
}

//! Error types for CSS parsing

use thiserror::Error;

/// Kind of syntax error met while parsing CSS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CssErrorKind {
    /// Unescaped newline inside a quoted string
    BadString,
    /// Unquoted `url(` with whitespace, quotes or parentheses inside
    BadUrl,
    /// Qualified rule without its `{}` block
    UnexpectedEof,
    /// Declaration not shaped like `<ident> : <value>`
    InvalidDeclaration,
}

impl CssErrorKind {
    fn describe(self) -> &'static str {
        match self {
            Self::BadString => "bad string token",
            Self::BadUrl => "bad url token",
            Self::UnexpectedEof => "EOF reached before {} block for a qualified rule",
            Self::InvalidDeclaration => "invalid declaration",
        }
    }
}

/// A CSS syntax error and where it starts (1-based line and column)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("CSS parse error at {line}:{column}: {}", kind.describe())]
pub struct CssParseError {
    pub kind: CssErrorKind,
    pub line: usize,
    pub column: usize,
}

impl CssParseError {
    /// Locate the error at byte offset `pos` of `source`.
    pub(crate) fn at(kind: CssErrorKind, source: &str, pos: usize) -> Self {
        let before = &source[..pos.min(source.len())];
        let line = before.matches('\n').count() + 1;
        let column = before
            .rsplit('\n')
            .next()
            .map_or(0, |tail| tail.chars().count())
            + 1;
        Self { kind, line, column }
    }
}

/// Result type alias for CSS parsing
pub type CssResult<T> = Result<T, CssParseError>;

//! Error types for the Cypher front end.

use std::fmt;

use thiserror::Error;

use super::lexer::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexErrorKind {
    UnterminatedString,
    BadNumber,
    BadEscape(char),
    UnexpectedChar(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub span: Span,
    pub kind: LexErrorKind,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LexErrorKind::UnterminatedString => {
                write!(f, "unterminated string literal at offset {}", self.span.start)
            }
            LexErrorKind::BadNumber => {
                write!(f, "malformed number literal at offset {}", self.span.start)
            }
            LexErrorKind::BadEscape(c) => write!(
                f,
                "unknown escape sequence '\\{}' at offset {}",
                c, self.span.start
            ),
            LexErrorKind::UnexpectedChar(c) => write!(
                f,
                "unexpected character '{}' at offset {}",
                c, self.span.start
            ),
        }
    }
}

impl std::error::Error for LexError {}

/// Parse failure: what the parser was looking for and what it saw.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("expected {expected}, found {found} at offset {}", .span.start)]
pub struct ParseError {
    pub span: Span,
    pub expected: String,
    pub found: String,
}

impl ParseError {
    pub fn new(span: Span, expected: impl Into<String>, found: impl Into<String>) -> Self {
        ParseError {
            span,
            expected: expected.into(),
            found: found.into(),
        }
    }
}

/// Any failure while turning source text into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CypherError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CypherError {
    pub fn span(&self) -> Span {
        match self {
            CypherError::Lex(e) => e.span,
            CypherError::Parse(e) => e.span,
        }
    }
}

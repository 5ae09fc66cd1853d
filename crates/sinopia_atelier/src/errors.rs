//! Atelier errors.

use compact_str::CompactString;
use thiserror::Error;

/// Errors raised while lexing, parsing or evaluating a template expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExpressionError {
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedCharacter { ch: char, offset: usize },

    #[error("unterminated string starting at offset {offset}")]
    UnterminatedString { offset: usize },

    #[error("invalid number literal '{text}' at offset {offset}")]
    InvalidNumber { text: CompactString, offset: usize },

    #[error("unexpected token '{found}' at offset {offset}")]
    UnexpectedToken { found: CompactString, offset: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("cannot read property '{property}' of {base}")]
    NullishAccess {
        property: CompactString,
        base: &'static str,
    },
}

/// Errors raised while building a directive set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectiveSetError {
    #[error("unknown directive '{0}' (expected one of: each, attr, style)")]
    Unknown(CompactString),

    #[error("directive '{0}' listed twice")]
    Duplicate(CompactString),
}

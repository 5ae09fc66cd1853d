//! Markup parse errors.

use serde::Serialize;
use thiserror::Error;

/// Parse error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum ErrorCode {
    /// An element was still open at the end of input or was closed implicitly
    MissingEndTag,
    /// A closing tag did not match any open element
    InvalidEndTag,
    /// `</>` with no tag name
    MissingEndTagName,
    /// The same attribute appeared twice on one element
    DuplicateAttribute,
    /// Input ended inside a tag
    EofInTag,
    /// Input ended inside a comment
    EofInComment,
}

impl ErrorCode {
    pub const fn message(self) -> &'static str {
        match self {
            Self::MissingEndTag => "Element is missing end tag.",
            Self::InvalidEndTag => "Invalid end tag.",
            Self::MissingEndTagName => "End tag name was expected.",
            Self::DuplicateAttribute => "Duplicate attribute.",
            Self::EofInTag => "Unexpected EOF in tag.",
            Self::EofInComment => "Unexpected EOF in comment.",
        }
    }
}

/// A recoverable parse error at a byte offset.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{} (offset {offset})", .code.message())]
pub struct ParseError {
    pub code: ErrorCode,
    pub offset: usize,
}

impl ParseError {
    pub fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }
}

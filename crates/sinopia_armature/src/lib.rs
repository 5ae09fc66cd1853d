//! Armature - The structural markup parser for Sinopia.
//!
//! The armature is the frame a sculpture is built around. This crate turns a
//! markup string into a live [`sinopia_relief::Node`] tree:
//!
//! - [`tokenizer`]: a byte-level state machine reporting spans through [`Callbacks`]
//! - [`parser`]: a tree builder driving the tokenizer and recovering leniently
//!
//! Parse errors are collected, never fatal: templates are user content and the
//! compiler does not validate markup beyond token and directive matching.

pub mod errors;
pub mod parser;
pub mod tokenizer;

pub use errors::{ErrorCode, ParseError};
pub use parser::{parse, parse_template, parse_with_options, Parser, ParserOptions};
pub use tokenizer::{Callbacks, QuoteType, Tokenizer};

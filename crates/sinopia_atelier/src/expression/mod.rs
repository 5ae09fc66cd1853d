//! The template expression language.
//!
//! A restricted, side-effect free subset of script expressions: literals,
//! identifiers, member and index access, object and array literals, unary
//! `! - +`, arithmetic, comparisons, `&&`/`||` and the conditional operator.
//! There are no calls and no assignments, so evaluating a template can never
//! run arbitrary code.

mod ast;
mod eval;
mod lexer;
mod parser;

use compact_str::CompactString;
use sinopia_tempera::{Object, Tracker, Value};

pub use ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
pub use eval::get_property;
pub use lexer::{tokenize, Token, TokenKind};
pub use parser::parse_expression;

use crate::errors::ExpressionError;

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: CompactString,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExpressionError> {
        let source = source.trim();
        Ok(Self {
            ast: parse_expression(source)?,
            source: source.into(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    /// Evaluate against `scope`, subscribing `tracker` to every property read.
    pub fn evaluate(&self, scope: &Object, tracker: Option<&Tracker>) -> Result<Value, ExpressionError> {
        eval::evaluate(&self.ast, scope, tracker)
    }
}

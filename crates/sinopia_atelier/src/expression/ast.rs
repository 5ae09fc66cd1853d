//! Expression AST.

use compact_str::CompactString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

impl BinaryOp {
    pub fn from_punct(punct: &str) -> Option<Self> {
        Some(match punct {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "%" => Self::Rem,
            "==" => Self::Eq,
            "!=" => Self::NotEq,
            "===" => Self::StrictEq,
            "!==" => Self::StrictNotEq,
            "<" => Self::Lt,
            "<=" => Self::LtEq,
            ">" => Self::Gt,
            ">=" => Self::GtEq,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
}

/// Expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(CompactString),
    Identifier(CompactString),
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: CompactString,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Array(Vec<Expr>),
    Object(Vec<(CompactString, Expr)>),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Logical {
        op: LogicalOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Conditional {
        test: Box<Expr>,
        consequent: Box<Expr>,
        alternate: Box<Expr>,
    },
}

impl Expr {
    /// Top-level identifiers the expression reads, in first-use order.
    pub fn free_identifiers(&self) -> Vec<CompactString> {
        let mut out = Vec::new();
        self.collect_identifiers(&mut out);
        out
    }

    fn collect_identifiers(&self, out: &mut Vec<CompactString>) {
        match self {
            Self::Identifier(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Self::Member { object, .. } => object.collect_identifiers(out),
            Self::Index { object, index } => {
                object.collect_identifiers(out);
                index.collect_identifiers(out);
            }
            Self::Array(items) => items.iter().for_each(|item| item.collect_identifiers(out)),
            Self::Object(entries) => entries
                .iter()
                .for_each(|(_, value)| value.collect_identifiers(out)),
            Self::Unary { operand, .. } => operand.collect_identifiers(out),
            Self::Binary { left, right, .. } | Self::Logical { left, right, .. } => {
                left.collect_identifiers(out);
                right.collect_identifiers(out);
            }
            Self::Conditional {
                test,
                consequent,
                alternate,
            } => {
                test.collect_identifiers(out);
                consequent.collect_identifiers(out);
                alternate.collect_identifiers(out);
            }
            Self::Undefined | Self::Null | Self::Bool(_) | Self::Number(_) | Self::String(_) => {}
        }
    }
}

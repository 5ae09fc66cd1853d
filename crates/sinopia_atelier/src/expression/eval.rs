//! Expression evaluation.
//!
//! Evaluation reads from a scope object. Every property read goes through the
//! observable API with the caller's tracker, which is how bound expressions
//! learn their dependencies.

use std::cmp::Ordering;

use compact_str::{CompactString, ToCompactString};
use sinopia_tempera::{Array, Object, Tracker, Value};

use super::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::errors::ExpressionError;

pub fn evaluate(
    expr: &Expr,
    scope: &Object,
    tracker: Option<&Tracker>,
) -> Result<Value, ExpressionError> {
    Ok(match expr {
        Expr::Undefined => Value::Undefined,
        Expr::Null => Value::Null,
        Expr::Bool(b) => Value::Bool(*b),
        Expr::Number(n) => Value::Number(*n),
        Expr::String(s) => Value::String(s.clone()),
        Expr::Identifier(name) => scope.get(name, tracker),
        Expr::Member { object, property } => {
            let base = evaluate(object, scope, tracker)?;
            get_property(&base, property, tracker)?
        }
        Expr::Index { object, index } => {
            let base = evaluate(object, scope, tracker)?;
            let key = evaluate(index, scope, tracker)?;
            get_indexed(&base, &key, tracker)?
        }
        Expr::Array(items) => {
            let values = items
                .iter()
                .map(|item| evaluate(item, scope, tracker))
                .collect::<Result<Vec<_>, _>>()?;
            Value::Array(Array::from_vec(values))
        }
        Expr::Object(entries) => {
            let object = Object::new();
            for (key, value) in entries {
                object.set(key.clone(), evaluate(value, scope, tracker)?);
            }
            Value::Object(object)
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope, tracker)?;
            match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Minus => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            }
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope, tracker)?;
            let right = evaluate(right, scope, tracker)?;
            binary(*op, &left, &right)
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, scope, tracker)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => left,
                _ => evaluate(right, scope, tracker)?,
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, scope, tracker)?.is_truthy() {
                evaluate(consequent, scope, tracker)?
            } else {
                evaluate(alternate, scope, tracker)?
            }
        }
    })
}

/// `base.property`
pub fn get_property(
    base: &Value,
    property: &str,
    tracker: Option<&Tracker>,
) -> Result<Value, ExpressionError> {
    Ok(match base {
        Value::Undefined | Value::Null => {
            return Err(ExpressionError::NullishAccess {
                property: property.into(),
                base: base.type_name(),
            })
        }
        Value::Object(object) => object.get(property, tracker),
        Value::Array(array) => {
            if property == "length" {
                Value::Number(array.len(tracker) as f64)
            } else if let Ok(index) = property.parse::<usize>() {
                array.get(index, tracker)
            } else {
                Value::Undefined
            }
        }
        Value::String(s) => {
            if property == "length" {
                Value::Number(s.encode_utf16().count() as f64)
            } else if let Ok(index) = property.parse::<usize>() {
                s.chars()
                    .nth(index)
                    .map_or(Value::Undefined, |c| Value::String(c.to_compact_string()))
            } else {
                Value::Undefined
            }
        }
        Value::Bool(_) | Value::Number(_) => Value::Undefined,
    })
}

/// `base[key]`
fn get_indexed(base: &Value, key: &Value, tracker: Option<&Tracker>) -> Result<Value, ExpressionError> {
    let property: CompactString = match key {
        Value::Number(n) if n.fract() == 0.0 && *n >= 0.0 => {
            if let Value::Array(array) = base {
                return Ok(array.get(*n as usize, tracker));
            }
            key.to_js_string()
        }
        _ => key.to_js_string(),
    };
    get_property(base, &property, tracker)
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::LtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::GtEq => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
    }
}

fn is_string_like(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Array(_) | Value::Object(_))
}

fn add(left: &Value, right: &Value) -> Value {
    if is_string_like(left) || is_string_like(right) {
        let mut out = left.to_js_string();
        out.push_str(&right.to_js_string());
        Value::String(out)
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

/// Relational comparison; `None` when either side is NaN.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}

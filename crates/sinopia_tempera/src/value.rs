//! Dynamic values.
//!
//! Scalars are stored inline; objects and arrays are shared observable
//! handles, so cloning a [`Value`] never copies collection contents.
//! Truthiness, equality and string conversion follow the usual scripting
//! conventions templates are written against.

use compact_str::{format_compact, CompactString, ToCompactString};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::array::Array;
use crate::object::Object;

#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(CompactString),
    Array(Array),
    Object(Object),
}

impl Value {
    /// Convert JSON into observable values.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Self::String(s.into()),
            serde_json::Value::Array(items) => {
                Self::Array(Array::from_vec(items.iter().map(Self::from_json).collect()))
            }
            serde_json::Value::Object(map) => Self::Object(Object::from_entries(
                map.iter().map(|(k, v)| (k.as_str(), Self::from_json(v))),
            )),
        }
    }

    /// Snapshot as JSON. `undefined` and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    #[inline]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
            Self::Array(_) | Self::Object(_) => true,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Identity-aware equality: scalars by value (NaN equals NaN),
    /// collections by handle.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b || (a.is_nan() && b.is_nan()),
            _ => self.strict_equals(other),
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a.ptr_eq(b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_nullish() && b.is_nullish() => true,
            (a, b) if a.is_nullish() || b.is_nullish() => false,
            (Self::Array(_) | Self::Object(_), Self::Array(_) | Self::Object(_)) => {
                self.strict_equals(other)
            }
            (Self::Array(_) | Self::Object(_), _) => {
                Self::String(self.to_js_string()).loose_equals(other)
            }
            (_, Self::Array(_) | Self::Object(_)) => {
                self.loose_equals(&Self::String(other.to_js_string()))
            }
            (Self::String(a), Self::String(b)) => a == b,
            _ => {
                let (a, b) = (self.to_number(), other.to_number());
                a == b
            }
        }
    }

    /// Numeric conversion.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
            Self::Array(_) | Self::Object(_) => string_to_number(&self.to_js_string()),
        }
    }

    /// String conversion (`String(value)`).
    pub fn to_js_string(&self) -> CompactString {
        match self {
            Self::Undefined => CompactString::const_new("undefined"),
            Self::Null => CompactString::const_new("null"),
            Self::Bool(b) => b.to_compact_string(),
            Self::Number(n) => number_to_string(*n),
            Self::String(s) => s.clone(),
            Self::Array(array) => {
                let mut out = CompactString::default();
                for (i, item) in array.to_vec(None).iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    if !item.is_nullish() {
                        out.push_str(&item.to_js_string());
                    }
                }
                out
            }
            Self::Object(_) => CompactString::const_new("[object Object]"),
        }
    }

    /// Text shown when the value is rendered: nullish values render empty.
    pub fn to_display_string(&self) -> CompactString {
        if self.is_nullish() {
            CompactString::default()
        } else {
            self.to_js_string()
        }
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf"/"nan" spellings that scripts do not
        _ if trimmed.chars().any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E')) => {
            f64::NAN
        }
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

fn number_to_string(n: f64) -> CompactString {
    if n.is_nan() {
        CompactString::const_new("NaN")
    } else if n.is_infinite() {
        CompactString::const_new(if n > 0.0 { "Infinity" } else { "-Infinity" })
    } else if n == 0.0 {
        CompactString::const_new("0")
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format_compact!("{}", n as i128)
    } else {
        format_compact!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value(other)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) if !n.is_finite() => serializer.serialize_unit(),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::Array(array) => {
                let items = array.to_vec(None);
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in &items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Object(object) => {
                let entries = object.entries(None);
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in &entries {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<CompactString> for Value {
    fn from(value: CompactString) -> Self {
        Self::String(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Self::Object(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::Array(Array::from_vec(value))
    }
}

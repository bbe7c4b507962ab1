//! Typed attribute values and the closed set of value kinds

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed attribute values carried by records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Array(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

/// Attribute collection keyed by name
pub type Attrs = BTreeMap<String, AttrValue>;

/// Classification of values for merge dispatch
///
/// Every variant of [`AttrValue`] falls into exactly one kind. Merging is
/// defined per kind pair; anything outside the defined pairs is resolved
/// by the configured mismatch policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Int or Float scalar
    Numeric,
    /// Ordered sequence
    Sequence,
    /// Nested key/value mapping
    Mapping,
    /// String, Bool — not combinable
    Opaque,
}

impl AttrValue {
    /// The value's kind for merge dispatch
    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Int(_) | AttrValue::Float(_) => ValueKind::Numeric,
            AttrValue::Array(_) => ValueKind::Sequence,
            AttrValue::Map(_) => ValueKind::Mapping,
            AttrValue::String(_) | AttrValue::Bool(_) => ValueKind::Opaque,
        }
    }

    /// Numeric view of the value, if it is a scalar number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(i) => Some(*i as f64),
            AttrValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Whether the value counts as a set flag when probed
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(b) => *b,
            AttrValue::String(s) => !s.is_empty(),
            AttrValue::Int(i) => *i != 0,
            AttrValue::Float(f) => *f != 0.0,
            AttrValue::Array(a) => !a.is_empty(),
            AttrValue::Map(m) => !m.is_empty(),
        }
    }

    /// Convert from a JSON value
    ///
    /// Integers that fit i64 become `Int`, all other numbers become
    /// `Float`. JSON `null` carries no information for fusion and maps to
    /// an empty `Map`, which merges neutrally.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => AttrValue::Map(BTreeMap::new()),
            serde_json::Value::Bool(b) => AttrValue::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    AttrValue::Int(i)
                } else {
                    AttrValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => AttrValue::String(s),
            serde_json::Value::Array(items) => {
                AttrValue::Array(items.into_iter().map(AttrValue::from_json).collect())
            }
            serde_json::Value::Object(fields) => AttrValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, AttrValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::String(s) => serde_json::Value::String(s.clone()),
            AttrValue::Int(i) => serde_json::Value::Number((*i).into()),
            AttrValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
            AttrValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(AttrValue::to_json).collect())
            }
            AttrValue::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Compact textual representation, used for content hashing and sizing
    pub fn to_compact_string(&self) -> String {
        self.to_json().to_string()
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::String(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::String(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(items: Vec<AttrValue>) -> Self {
        AttrValue::Array(items)
    }
}

impl From<Attrs> for AttrValue {
    fn from(attrs: Attrs) -> Self {
        AttrValue::Map(attrs)
    }
}

//! Metadata values.
//!
//! A value is either text (which may be empty) or a JSON composite. Values
//! round-trip exactly: an empty string is a real value, distinct from a key
//! that has no values at all.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single metadata value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetaValue(serde_json::Value);

impl MetaValue {
    /// A text value.
    pub fn text(s: impl Into<String>) -> Self {
        Self(serde_json::Value::String(s.into()))
    }

    /// Wraps an arbitrary JSON value (arrays and objects are composites).
    #[must_use]
    pub fn json(value: serde_json::Value) -> Self {
        Self(value)
    }

    /// Returns the text if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_str()
    }

    /// Whether this value counts as "nothing submitted".
    ///
    /// Empty text, null, and empty arrays/objects are empty. `"0"` and
    /// `false` are not.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            serde_json::Value::Null => true,
            serde_json::Value::String(s) => s.is_empty(),
            serde_json::Value::Array(a) => a.is_empty(),
            serde_json::Value::Object(o) => o.is_empty(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
        }
    }

    /// Encodes the value for storage.
    pub fn encode(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Decodes a value previously produced by [`MetaValue::encode`].
    pub fn decode(raw: &str) -> crate::Result<Self> {
        Ok(Self(serde_json::from_str(raw)?))
    }
}

/// Values are equal when they encode to the same bytes, so object key order
/// matters.
impl PartialEq for MetaValue {
    fn eq(&self, other: &Self) -> bool {
        same_encoding(&self.0, &other.0)
    }
}

fn same_encoding(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    use serde_json::Value;
    match (a, b) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_encoding(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().zip(b).all(|((ka, va), (kb, vb))| ka == kb && same_encoding(va, vb))
        }
        _ => a == b,
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        Self::text(s)
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        Self::text(s)
    }
}

impl From<serde_json::Value> for MetaValue {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            serde_json::Value::String(s) => f.write_str(s),
            other => write!(f, "{other}"),
        }
    }
}

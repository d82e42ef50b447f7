//! Values produced by one field visit.
//!
//! A visit returns either nothing, a plain scalar, or an [`Envelope`] that
//! descendant visits read from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Intermediate value passed from a mutation field to its descendants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Value that was written, or `null`.
    pub payload: Value,

    /// Resolved type tag.
    #[serde(rename = "__typename", default, skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,

    /// Key generated by an append.
    #[serde(rename = "generatedKey", default, skip_serializing_if = "Option::is_none")]
    pub generated_key: Option<String>,
}

impl Envelope {
    /// Envelope carrying `payload` with no tag or key.
    #[must_use]
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            type_tag: None,
            generated_key: None,
        }
    }

    /// Envelope with a `null` payload.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    /// Attach a type tag.
    #[must_use]
    pub fn with_type_tag(mut self, type_tag: Option<String>) -> Self {
        self.type_tag = type_tag;
        self
    }

    /// Attach a generated key.
    #[must_use]
    pub fn with_generated_key(mut self, key: impl Into<String>) -> Self {
        self.generated_key = Some(key.into());
        self
    }

    /// The payload if it is not `null`.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        if self.payload.is_null() {
            None
        } else {
            Some(&self.payload)
        }
    }

    /// `payload[key]`, or `null` when the payload is not an object or lacks it.
    #[must_use]
    pub fn slice(&self, key: &str) -> Value {
        self.payload.get(key).cloned().unwrap_or(Value::Null)
    }
}

/// Result of resolving one field.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolvedValue {
    /// Absent value. Also the initial root of an execution.
    #[default]
    Null,
    /// Plain JSON value.
    Scalar(Value),
    /// Envelope for descendants to consume.
    Envelope(Envelope),
}

impl ResolvedValue {
    /// Wrap a JSON value, mapping JSON `null` to [`ResolvedValue::Null`].
    #[must_use]
    pub fn scalar(value: Value) -> Self {
        if value.is_null() {
            Self::Null
        } else {
            Self::Scalar(value)
        }
    }

    /// Wrap an optional string.
    #[must_use]
    pub fn string(value: Option<&str>) -> Self {
        value.map_or(Self::Null, |s| Self::Scalar(Value::String(s.to_string())))
    }

    /// True for [`ResolvedValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The envelope, if this is one.
    #[must_use]
    pub const fn as_envelope(&self) -> Option<&Envelope> {
        match self {
            Self::Envelope(e) => Some(e),
            _ => None,
        }
    }

    /// Non-null envelope payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<&Value> {
        self.as_envelope().and_then(Envelope::payload)
    }

    /// Envelope type tag, if any.
    #[must_use]
    pub fn type_tag(&self) -> Option<&str> {
        self.as_envelope().and_then(|e| e.type_tag.as_deref())
    }

    /// Envelope generated key, if any.
    #[must_use]
    pub fn generated_key(&self) -> Option<&str> {
        self.as_envelope().and_then(|e| e.generated_key.as_deref())
    }

    /// Render as JSON for placement in the result tree.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Scalar(v) => v.clone(),
            Self::Envelope(e) => {
                let mut obj = Map::new();
                obj.insert("payload".to_string(), e.payload.clone());
                if let Some(tag) = &e.type_tag {
                    obj.insert("__typename".to_string(), Value::String(tag.clone()));
                }
                if let Some(key) = &e.generated_key {
                    obj.insert("generatedKey".to_string(), Value::String(key.clone()));
                }
                Value::Object(obj)
            }
        }
    }
}

impl From<Envelope> for ResolvedValue {
    fn from(e: Envelope) -> Self {
        Self::Envelope(e)
    }
}

impl From<Value> for ResolvedValue {
    fn from(v: Value) -> Self {
        Self::scalar(v)
    }
}

use crate::DocumentPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The field set of a document. Field names are top-level keys.
pub type Fields = serde_json::Map<String, Value>;

/// A read of one document at one point in time.
///
/// Snapshots only exist for documents that exist; an absent document is
/// represented by `None` wherever a snapshot is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub path: DocumentPath,
    #[serde(default)]
    pub data: Fields,
}

impl DocumentSnapshot {
    pub fn new(path: DocumentPath, data: Fields) -> Self {
        Self { path, data }
    }

    /// The document id (last path segment).
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Extract a string value from a top-level field.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(|v| v.as_str())
    }

    /// Extract a numeric value from a top-level field.
    pub fn get_number(&self, field: &str) -> Option<f64> {
        self.data.get(field).and_then(|v| v.as_f64())
    }
}

/// Whether a field value counts as "set".
///
/// `null`, `false`, `0` and `""` are falsy; everything else (including empty
/// arrays and objects) is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Renders a truthy value as a path segment. Returns `None` for falsy values.
pub fn as_segment(value: &Value) -> Option<String> {
    if !is_truthy(value) {
        return None;
    }
    match value {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

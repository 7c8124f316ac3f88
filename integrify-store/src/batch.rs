//! Batched writes and field-level update sentinels.

use integrify_types::{DocumentPath, Fields};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// How one field of an existing document changes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite the field.
    Set(Value),
    /// Remove the field.
    Delete,
    /// Add to the field's numeric value. Missing or non-numeric fields
    /// are treated as zero.
    Increment(i64),
}

/// Field name → update, applied together to one document.
pub type UpdateMap = BTreeMap<String, FieldUpdate>;

/// One operation of a [`WriteBatch`].
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Apply field updates to an existing document.
    Update { path: DocumentPath, fields: UpdateMap },
    /// Delete a document. Deleting a missing document is not an error.
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Update { path, .. } | WriteOp::Delete { path } => path,
        }
    }
}

/// A list of writes committed atomically: either every operation is
/// applied or none is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, path: DocumentPath, fields: UpdateMap) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

/// Applies `updates` to a document's fields in place.
pub fn apply_update(fields: &mut Fields, updates: &UpdateMap) {
    for (name, update) in updates {
        match update {
            FieldUpdate::Set(value) => {
                fields.insert(name.clone(), value.clone());
            }
            FieldUpdate::Delete => {
                fields.remove(name);
            }
            FieldUpdate::Increment(delta) => {
                let next = increment(fields.get(name), *delta);
                fields.insert(name.clone(), next);
            }
        }
    }
}

fn increment(current: Option<&Value>, delta: i64) -> Value {
    match current.and_then(Value::as_number) {
        Some(n) if n.is_i64() => Value::from(n.as_i64().unwrap_or_default().saturating_add(delta)),
        Some(n) => n
            .as_f64()
            .and_then(|f| Number::from_f64(f + delta as f64))
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(delta)),
        None => Value::from(delta),
    }
}

//! Change events delivered to trigger handlers.
//!
//! A change is the before/after pair of one document write. Either side may
//! be absent: no `before` means the document was created, no `after` means
//! it was deleted. The context carries the route parameters the hosting
//! runtime extracted from the document path.

use crate::{DocumentSnapshot, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Route parameters bound from a `{param}` path pattern.
pub type Params = BTreeMap<String, String>;

/// Unique identifier for one trigger invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Per-invocation context supplied by the hosting runtime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContext {
    #[serde(default)]
    pub event_id: EventId,
    #[serde(default)]
    pub params: Params,
}

impl EventContext {
    #[must_use]
    pub fn new(params: Params) -> Self {
        Self {
            event_id: EventId::new(),
            params,
        }
    }

    /// Builds a context from `(name, value)` pairs.
    #[must_use]
    pub fn with_params<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self::new(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Field set used to resolve dynamic path tokens: the given document
    /// fields nested under `source`, with the route parameters merged on
    /// top-level (a parameter named `source` wins).
    pub fn token_fields(&self, source: Option<&Fields>) -> Fields {
        let mut fields = Fields::new();
        fields.insert(
            "source".to_string(),
            Value::Object(source.cloned().unwrap_or_default()),
        );
        for (name, value) in &self.params {
            fields.insert(name.clone(), Value::String(value.clone()));
        }
        fields
    }
}

/// The before/after pair of one document write.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub before: Option<DocumentSnapshot>,
    #[serde(default)]
    pub after: Option<DocumentSnapshot>,
}

impl Change {
    #[must_use]
    pub fn new(before: Option<DocumentSnapshot>, after: Option<DocumentSnapshot>) -> Self {
        Self { before, after }
    }

    /// A document was created.
    #[must_use]
    pub fn created(after: DocumentSnapshot) -> Self {
        Self::new(None, Some(after))
    }

    /// A document was updated in place.
    #[must_use]
    pub fn updated(before: DocumentSnapshot, after: DocumentSnapshot) -> Self {
        Self::new(Some(before), Some(after))
    }

    /// A document was deleted.
    #[must_use]
    pub fn deleted(before: DocumentSnapshot) -> Self {
        Self::new(Some(before), None)
    }

    /// The snapshot that identifies the written document: `after` if the
    /// document still exists, otherwise `before`.
    pub fn latest(&self) -> Option<&DocumentSnapshot> {
        self.after.as_ref().or(self.before.as_ref())
    }
}

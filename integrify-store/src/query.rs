use crate::error::{StoreError, StoreResult};
use integrify_types::{CollectionPath, DocumentSnapshot};
use serde_json::Value;
use std::fmt;

/// What a query scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryTarget {
    /// Documents directly inside one collection.
    Collection(CollectionPath),
    /// Documents of every collection with this id, at any depth.
    CollectionGroup(String),
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Value,
}

/// A collection or collection-group scan with an optional equality filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub target: QueryTarget,
    pub filter: Option<FieldFilter>,
}

impl Query {
    /// Every document in `path`.
    pub fn collection(path: CollectionPath) -> Self {
        Self {
            target: QueryTarget::Collection(path),
            filter: None,
        }
    }

    /// Every document in any collection named `id`.
    ///
    /// The id is a single segment; slashes are rejected.
    pub fn collection_group(id: impl Into<String>) -> StoreResult<Self> {
        let id = id.into();
        if id.is_empty() || id.contains('/') {
            return Err(StoreError::InvalidPath(format!(
                "collection group id must be a single segment: [{id}]"
            )));
        }
        Ok(Self {
            target: QueryTarget::CollectionGroup(id),
            filter: None,
        })
    }

    /// Restricts the scan to documents where `field == value`.
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter = Some(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Whether `snapshot` is part of this query's result.
    pub fn matches(&self, snapshot: &DocumentSnapshot) -> bool {
        let parent = snapshot.path.parent();
        let in_target = match &self.target {
            QueryTarget::Collection(path) => &parent == path,
            QueryTarget::CollectionGroup(id) => parent.id() == id,
        };
        in_target
            && self
                .filter
                .as_ref()
                .is_none_or(|f| snapshot.get(&f.field) == Some(&f.value))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            QueryTarget::Collection(path) => write!(f, "collection [{path}]")?,
            QueryTarget::CollectionGroup(id) => write!(f, "collection group [{id}]")?,
        }
        if let Some(filter) = &self.filter {
            write!(f, " where [{}] == {}", filter.field, filter.value)?;
        }
        Ok(())
    }
}

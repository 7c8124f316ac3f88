//! Change classification.
//!
//! Decides, per rule kind, whether an incoming change needs propagation and
//! what shape that work takes. Nothing here touches the store.

use crate::error::{IntegrifyError, IntegrifyResult};
use integrify_model::{DeleteTarget, ReplicateAttributesRule};
use integrify_types::{Change, Fields};
use std::collections::BTreeSet;

/// What happened to the written document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
    /// Neither side exists.
    NoOp,
}

impl ChangeKind {
    pub fn of(change: &Change) -> Self {
        match (&change.before, &change.after) {
            (None, Some(_)) => ChangeKind::Create,
            (Some(_), Some(_)) => ChangeKind::Update,
            (Some(_), None) => ChangeKind::Delete,
            (None, None) => ChangeKind::NoOp,
        }
    }
}

/// Source attributes named by any target's mapping.
pub fn tracked_attributes(rule: &ReplicateAttributesRule) -> BTreeSet<&str> {
    rule.targets
        .iter()
        .flat_map(|target| target.attribute_mapping.keys())
        .map(String::as_str)
        .collect()
}

/// Names of fields whose value differs between `before` and `after`,
/// including fields present on only one side.
pub fn changed_fields(before: Option<&Fields>, after: Option<&Fields>) -> BTreeSet<String> {
    let empty = Fields::new();
    let before = before.unwrap_or(&empty);
    let after = after.unwrap_or(&empty);

    let mut changed: BTreeSet<String> = after
        .iter()
        .filter(|(name, value)| before.get(name.as_str()) != Some(*value))
        .map(|(name, _)| name.clone())
        .collect();
    changed.extend(
        before
            .keys()
            .filter(|name| !after.contains_key(name.as_str()))
            .cloned(),
    );
    changed
}

/// Whether an update touched at least one replicated attribute.
pub fn is_relevant(rule: &ReplicateAttributesRule, change: &Change) -> bool {
    let tracked = tracked_attributes(rule);
    changed_fields(
        change.before.as_ref().map(|s| &s.data),
        change.after.as_ref().map(|s| &s.data),
    )
    .iter()
    .any(|field| tracked.contains(field.as_str()))
}

/// Direction of a maintained count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountDelta {
    Increment,
    Decrement,
}

impl CountDelta {
    /// `Increment` on create, `Decrement` on delete, `None` otherwise.
    pub fn for_change(change: &Change) -> Option<Self> {
        match ChangeKind::of(change) {
            ChangeKind::Create => Some(CountDelta::Increment),
            ChangeKind::Delete => Some(CountDelta::Decrement),
            ChangeKind::Update | ChangeKind::NoOp => None,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            CountDelta::Increment => 1,
            CountDelta::Decrement => -1,
        }
    }
}

/// A delete target must name a foreign key or opt into `deleteAll`.
pub fn validate_delete_target(target: &DeleteTarget) -> IntegrifyResult<()> {
    let has_key = target
        .foreign_key
        .as_deref()
        .is_some_and(|key| !key.trim().is_empty());
    if target.delete_all || has_key {
        Ok(())
    } else {
        Err(IntegrifyError::MissingForeignKey {
            collection: target.collection.clone(),
        })
    }
}

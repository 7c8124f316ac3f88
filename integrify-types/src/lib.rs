//! Core type definitions for Integrify.
//!
//! This crate defines the store-agnostic types shared by every Integrify
//! crate:
//! - Document and collection paths
//! - Document snapshots and field sets (JSON objects)
//! - Change events and the per-invocation event context
//!
//! Rules, the store boundary and the propagation engine live in their own
//! crates.

mod change;
mod document;
mod path;

pub use change::{Change, EventContext, EventId, Params};
pub use document::{as_segment, is_truthy, DocumentSnapshot, Fields};
pub use path::{CollectionPath, DocumentPath};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid path: {0}")]
    InvalidPath(String),
}

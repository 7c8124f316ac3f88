//! Document store boundary for Integrify.
//!
//! Rules read, query and batch-write documents only through the
//! [`DocumentStore`] trait. A production deployment implements it over its
//! document database; [`MemoryStore`] implements it in memory for tests and
//! offline replay.

mod batch;
mod error;
mod memory;
mod query;

pub use batch::{FieldUpdate, UpdateMap, WriteBatch, WriteOp, apply_update};
pub use error::{StoreError, StoreResult};
pub use memory::{MemoryStore, StoreStats};
pub use query::{FieldFilter, Query, QueryTarget};

use async_trait::async_trait;
use integrify_types::{DocumentPath, DocumentSnapshot};
use std::sync::Arc;

/// Reads and atomic batched writes against a document database.
///
/// Implementations must be safe to share across concurrently running
/// trigger invocations.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reads one document. `Ok(None)` if it does not exist.
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>>;

    /// Runs a collection or collection-group query.
    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Applies every write in `batch` atomically.
    async fn commit(&self, batch: WriteBatch) -> StoreResult<()>;
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    async fn get(&self, path: &DocumentPath) -> StoreResult<Option<DocumentSnapshot>> {
        (**self).get(path).await
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<DocumentSnapshot>> {
        (**self).query(query).await
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        (**self).commit(batch).await
    }
}

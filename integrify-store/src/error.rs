//! Error types for the store layer.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors a document store can report.
///
/// The engine never wraps or retries these; they surface to the trigger
/// runtime as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The caller may not perform the operation.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// An update addressed a document that does not exist.
    #[error("document not found: {0}")]
    NotFound(String),

    /// A path or collection-group id is malformed.
    #[error("invalid path: {0}")]
    InvalidPath(String),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<integrify_types::Error> for StoreError {
    fn from(err: integrify_types::Error) -> Self {
        match err {
            integrify_types::Error::InvalidPath(msg) => StoreError::InvalidPath(msg),
        }
    }
}

//! Error types for compiled rule handlers.

use integrify_model::{ModelError, TemplateError};
use integrify_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Result type for registration and trigger invocations.
pub type IntegrifyResult<T> = Result<T, IntegrifyError>;

/// Which side of the propagation phase a hook runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPhase {
    Pre,
    Post,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookPhase::Pre => f.write_str("pre"),
            HookPhase::Post => f.write_str("post"),
        }
    }
}

/// Errors raised while registering rules or running a compiled trigger.
#[derive(Debug, Error)]
pub enum IntegrifyError {
    /// A rule was registered before any configuration.
    #[error("integrify: not configured, register a configuration before any rule")]
    NotConfigured,

    /// The route parameter holding the source document's key is absent or empty.
    #[error("integrify: Missing a primary key [{key}] in the source params")]
    MissingPrimaryKey { key: String },

    /// A delete target has neither a foreign key nor `deleteAll`.
    #[error("integrify: missing foreign key or set deleteAll to true")]
    MissingForeignKey { collection: String },

    /// The written document lacks the field a count rule keys its target on.
    #[error("integrify: missing foreign key [{key}] on document [{path}]")]
    MissingForeignKeyValue { key: String, path: String },

    /// The change lacks the snapshot the trigger needs.
    #[error("integrify: change has no {0} snapshot")]
    MissingSnapshot(&'static str),

    /// A user hook returned an error.
    #[error("integrify: {phase} hook failed: {message}")]
    Hook { phase: HookPhase, message: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Model(#[from] ModelError),

    /// Store errors surface unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Path(#[from] integrify_types::Error),
}

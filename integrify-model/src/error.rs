//! Error types for rule definitions and key templates.

use crate::rule::RuleKind;
use thiserror::Error;

/// Result type for rule definition parsing.
pub type ModelResult<T> = Result<T, ModelError>;

/// Result type for template resolution.
pub type TemplateResult<T> = Result<T, TemplateError>;

/// Configuration errors raised while registering a definition.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The `rule` tag names no known rule kind.
    #[error("integrify: unknown rule kind [{0}]")]
    UnknownRuleKind(String),

    /// The object has neither a `rule` nor a `config` field.
    #[error("integrify: definition is neither a rule nor a configuration")]
    NotARuleOrConfig,

    /// The object has both a `rule` and a `config` field.
    #[error("integrify: definition cannot be both a rule and a configuration")]
    AmbiguousDefinition,

    /// The rule tag is known but the rest of the object does not fit it.
    #[error("integrify: invalid {kind} rule: {source}")]
    InvalidRule {
        kind: RuleKind,
        #[source]
        source: serde_json::Error,
    },

    /// The `config` object is malformed.
    #[error("integrify: invalid configuration: {0}")]
    InvalidConfig(#[source] serde_json::Error),
}

/// Errors resolving dynamic tokens in a target template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// A `$token` resolved to nothing; holds the token as written.
    #[error("integrify: Missing dynamic reference: [{0}]")]
    MissingDynamicReference(String),
}

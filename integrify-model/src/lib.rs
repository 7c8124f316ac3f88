//! Rule model for Integrify.
//!
//! Defines the declarative surface that every other Integrify crate compiles
//! or executes:
//! - [`Rule`]: tagged union of the three propagation rules
//!   (`REPLICATE_ATTRIBUTES`, `DELETE_REFERENCES`, `MAINTAIN_COUNT`)
//! - [`Hook`] / [`Hooks`]: optional side-effect callbacks around propagation
//! - [`Definition`]: rule-or-configuration classification of JSON input
//! - [`template`]: primary keys, `$token` resolution and
//!   route matching
//!
//! Rules are plain data plus hooks; they know nothing about stores or
//! runtimes.

mod definition;
mod error;
mod handler;
mod rule;
pub mod template;

pub use definition::{ConfigOptions, Definition};
pub use error::{ModelError, ModelResult, TemplateError, TemplateResult};
pub use handler::{CountHooks, Hook, HookResult, Hooks, KeyFormatter};
pub use rule::{
    CountSource, CountTarget, DeleteReferencesRule, DeleteTarget, MaintainCountRule,
    ReplicateAttributesRule, ReplicateTarget, Rule, RuleKind, SourceSpec, COUNT_DOCUMENT_KEY,
};
pub use template::{PrimaryKey, TargetResolution, DEFAULT_PRIMARY_KEY};

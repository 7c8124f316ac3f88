//! Rule compilation and propagation for Integrify.
//!
//! # Architecture
//!
//! Rules are declared once and compiled into triggers. Each trigger reacts
//! to writes on one document pattern and keeps denormalized state in other
//! collections consistent with the written document.
//!
//! ## Components
//!
//! - **Dispatcher**: [`Integrify`] holds the configuration and compiles rules
//! - **Classifier**: decides whether a change needs any work
//! - **Executor**: queries targets and commits one batch per target
//! - **Router**: [`TriggerRouter`] fires compiled triggers for local writes
//!
//! ## Invocation
//!
//! 1. **Bind**: the runtime matches the written path and extracts route params
//! 2. **Resolve**: the primary key and any `$token` target paths are resolved
//! 3. **Classify**: irrelevant changes stop here
//! 4. **Propagate**: `pre` hook, one batch per target in order, `post` hook
//!
//! # Example
//!
//! ```
//! use integrify_engine::{Integrify, IntegrifyConfig, TriggerRouter};
//! use integrify_model::{ReplicateAttributesRule, ReplicateTarget, Rule};
//! use integrify_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let integrify = Integrify::configured(IntegrifyConfig::new(store));
//!
//! let rule: Rule = ReplicateAttributesRule::new("master")
//!     .target(ReplicateTarget::new("detail1", "masterId").map("name", "masterName"))
//!     .into();
//!
//! let mut router = TriggerRouter::new();
//! router.register(integrify.compile(rule).unwrap());
//! assert_eq!(router.len(), 1);
//! ```

pub mod classifier;
mod config;
mod dispatcher;
mod error;
pub mod executor;
mod router;
mod trigger;

pub use classifier::{ChangeKind, CountDelta};
pub use config::IntegrifyConfig;
pub use dispatcher::{Integrify, Registration};
pub use error::{HookPhase, IntegrifyError, IntegrifyResult};
pub use router::{DispatchOutcome, TriggerRouter};
pub use trigger::{CompiledTrigger, TriggerEvent, TriggerHandler};

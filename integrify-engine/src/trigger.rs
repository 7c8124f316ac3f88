//! Compiled triggers: what the hosting runtime registers.

use crate::classifier::ChangeKind;
use crate::config::IntegrifyConfig;
use crate::error::{IntegrifyError, IntegrifyResult};
use crate::executor;
use async_trait::async_trait;
use integrify_model::{DeleteReferencesRule, MaintainCountRule, ReplicateAttributesRule};
use integrify_types::{Change, EventContext};
use std::fmt;
use std::sync::Arc;

/// Which document writes fire a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    OnCreate,
    OnUpdate,
    OnDelete,
    /// Creates, updates and deletes.
    OnWrite,
}

impl TriggerEvent {
    pub fn accepts(self, kind: ChangeKind) -> bool {
        match (self, kind) {
            (_, ChangeKind::NoOp) => false,
            (TriggerEvent::OnWrite, _) => true,
            (TriggerEvent::OnCreate, ChangeKind::Create)
            | (TriggerEvent::OnUpdate, ChangeKind::Update)
            | (TriggerEvent::OnDelete, ChangeKind::Delete) => true,
            _ => false,
        }
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerEvent::OnCreate => "onCreate",
            TriggerEvent::OnUpdate => "onUpdate",
            TriggerEvent::OnDelete => "onDelete",
            TriggerEvent::OnWrite => "onWrite",
        };
        f.write_str(name)
    }
}

/// Handles one document write.
///
/// An error fails the invocation; the hosting runtime decides whether to
/// retry it.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(&self, change: &Change, ctx: &EventContext) -> IntegrifyResult<()>;
}

/// A rule bound to a document pattern and event, ready to register.
#[derive(Clone)]
pub struct CompiledTrigger {
    pub name: String,
    /// Document path pattern with `{param}` segments, e.g. `master/{masterId}`.
    pub document_pattern: String,
    pub event: TriggerEvent,
    pub handler: Arc<dyn TriggerHandler>,
}

impl CompiledTrigger {
    pub async fn invoke(&self, change: &Change, ctx: &EventContext) -> IntegrifyResult<()> {
        self.handler.handle(change, ctx).await
    }
}

impl fmt::Debug for CompiledTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledTrigger")
            .field("name", &self.name)
            .field("document_pattern", &self.document_pattern)
            .field("event", &self.event)
            .finish_non_exhaustive()
    }
}

pub(crate) struct ReplicateHandler {
    pub rule: ReplicateAttributesRule,
    pub pattern: String,
    pub config: Arc<IntegrifyConfig>,
}

#[async_trait]
impl TriggerHandler for ReplicateHandler {
    async fn handle(&self, change: &Change, ctx: &EventContext) -> IntegrifyResult<()> {
        executor::replicate_attributes(&self.rule, &self.pattern, &self.config, change, ctx).await
    }
}

pub(crate) struct DeleteHandler {
    pub rule: DeleteReferencesRule,
    pub pattern: String,
    pub config: Arc<IntegrifyConfig>,
}

#[async_trait]
impl TriggerHandler for DeleteHandler {
    async fn handle(&self, change: &Change, ctx: &EventContext) -> IntegrifyResult<()> {
        let deleted = change
            .before
            .as_ref()
            .ok_or(IntegrifyError::MissingSnapshot("before"))?;
        executor::delete_references(&self.rule, &self.pattern, &self.config, deleted, ctx).await
    }
}

pub(crate) struct CountHandler {
    pub rule: MaintainCountRule,
    pub config: Arc<IntegrifyConfig>,
}

#[async_trait]
impl TriggerHandler for CountHandler {
    async fn handle(&self, change: &Change, ctx: &EventContext) -> IntegrifyResult<()> {
        executor::maintain_count(&self.rule, &self.config, change, ctx).await
    }
}

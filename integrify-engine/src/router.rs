//! In-process trigger runtime.
//!
//! Matches document writes against registered trigger patterns and invokes
//! the matching handlers with route params bound from the path. Used by the
//! replay tool and end-to-end tests in place of a hosted runtime.

use crate::classifier::ChangeKind;
use crate::error::IntegrifyResult;
use crate::trigger::CompiledTrigger;
use integrify_model::template::match_route;
use integrify_types::{Change, DocumentPath, EventContext, Params};
use tracing::{debug, warn};

/// Result of one trigger fired by [`TriggerRouter::dispatch`].
#[derive(Debug)]
pub struct DispatchOutcome {
    pub trigger: String,
    pub result: IntegrifyResult<()>,
}

impl DispatchOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Debug, Default)]
pub struct TriggerRouter {
    triggers: Vec<CompiledTrigger>,
}

impl TriggerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, trigger: CompiledTrigger) {
        debug!(
            "integrify: Registered [{}] on [{}] ({})",
            trigger.name, trigger.document_pattern, trigger.event
        );
        self.triggers.push(trigger);
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    pub fn triggers(&self) -> &[CompiledTrigger] {
        &self.triggers
    }

    /// Triggers that fire for a write of `kind` to `path`, in registration
    /// order, with their bound route params.
    pub fn matching(&self, path: &DocumentPath, kind: ChangeKind) -> Vec<(&CompiledTrigger, Params)> {
        self.triggers
            .iter()
            .filter(|trigger| trigger.event.accepts(kind))
            .filter_map(|trigger| {
                match_route(&trigger.document_pattern, path.as_str()).map(|params| (trigger, params))
            })
            .collect()
    }

    /// Fires every matching trigger in turn. A failing trigger does not stop
    /// later ones; each outcome is reported.
    pub async fn dispatch(&self, path: &DocumentPath, change: &Change) -> Vec<DispatchOutcome> {
        let kind = ChangeKind::of(change);
        let mut outcomes = Vec::new();
        for (trigger, params) in self.matching(path, kind) {
            let ctx = EventContext::new(params);
            debug!(
                "integrify: Firing [{}] for {kind:?} of [{path}] (event {})",
                trigger.name, ctx.event_id
            );
            let result = trigger.invoke(change, &ctx).await;
            if let Err(e) = &result {
                warn!("integrify: Trigger [{}] failed for [{path}]: {e}", trigger.name);
            }
            outcomes.push(DispatchOutcome {
                trigger: trigger.name.clone(),
                result,
            });
        }
        outcomes
    }
}

//! Offline replay of document writes through compiled Integrify rules.

use anyhow::{Context, Result};
use integrify_engine::{DispatchOutcome, Integrify, IntegrifyConfig, TriggerRouter};
use integrify_model::ConfigOptions;
use integrify_store::MemoryStore;
use integrify_types::{Change, DocumentPath, DocumentSnapshot, Fields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// One recorded write. A missing `after` is a delete.
///
/// When `before` is omitted, the document's current state in the store is
/// used.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ReplayEvent {
    pub path: String,
    #[serde(default)]
    pub before: Option<Fields>,
    #[serde(default)]
    pub after: Option<Fields>,
}

/// Totals reported after a replay.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub fired: usize,
    pub failed: usize,
}

/// Reads and parses a JSON file.
pub fn load_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
}

/// Parses an events file: a JSON array of [`ReplayEvent`]s.
pub fn parse_events(value: Value) -> Result<Vec<ReplayEvent>> {
    serde_json::from_value(value).context("events must be an array of {path, before, after}")
}

/// An in-memory store with rules registered against it.
pub struct Replay {
    store: Arc<MemoryStore>,
    router: TriggerRouter,
}

impl Replay {
    /// Seeds a store and compiles every definition in `rules` (an array of
    /// rule and config objects, or a single object).
    pub fn new(rules: &Value, seed: Option<&Value>, verbose: bool) -> Result<Self> {
        let store = Arc::new(match seed {
            Some(seed) => MemoryStore::from_json(seed).context("invalid seed")?,
            None => MemoryStore::new(),
        });

        let config = IntegrifyConfig::new(store.clone()).with_options(ConfigOptions { verbose });
        let mut integrify = Integrify::configured(config);
        let mut router = TriggerRouter::new();

        let definitions = match rules {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        };
        for (index, definition) in definitions.into_iter().enumerate() {
            let compiled = integrify
                .integrify_json(definition)
                .with_context(|| format!("invalid definition at index {index}"))?;
            if let Some(trigger) = compiled {
                router.register(trigger);
            }
        }
        info!("Registered {} trigger(s)", router.len());

        Ok(Self { store, router })
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    pub fn router(&self) -> &TriggerRouter {
        &self.router
    }

    /// Writes one event to the store, then fires the triggers it matches.
    pub async fn apply(&self, event: &ReplayEvent) -> Result<Vec<DispatchOutcome>> {
        let path = DocumentPath::parse(&event.path)
            .with_context(|| format!("invalid event path [{}]", event.path))?;

        let before = match &event.before {
            Some(fields) => Some(fields.clone()),
            None => self.store.document(path.as_str()).await,
        };
        match &event.after {
            Some(fields) => {
                self.store
                    .set(path.as_str(), Value::Object(fields.clone()))
                    .await?;
            }
            None => {
                self.store.remove(path.as_str()).await?;
            }
        }

        let change = Change::new(
            before.map(|data| DocumentSnapshot::new(path.clone(), data)),
            event.after.clone().map(|data| DocumentSnapshot::new(path.clone(), data)),
        );
        Ok(self.router.dispatch(&path, &change).await)
    }

    /// Applies events in order. Trigger failures are counted, not fatal.
    pub async fn run(&self, events: &[ReplayEvent]) -> Result<ReplaySummary> {
        let mut summary = ReplaySummary::default();
        for event in events {
            let outcomes = self.apply(event).await?;
            summary.events += 1;
            summary.fired += outcomes.len();
            summary.failed += outcomes.iter().filter(|o| !o.is_ok()).count();
        }
        Ok(summary)
    }
}

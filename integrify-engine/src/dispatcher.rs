//! Rule registration.

use crate::config::IntegrifyConfig;
use crate::error::{IntegrifyError, IntegrifyResult};
use crate::trigger::{
    CompiledTrigger, CountHandler, DeleteHandler, ReplicateHandler, TriggerEvent, TriggerHandler,
};
use integrify_model::{Definition, Rule};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Input to [`Integrify::integrify`].
pub enum Registration {
    Config(IntegrifyConfig),
    Rule(Rule),
}

impl From<IntegrifyConfig> for Registration {
    fn from(config: IntegrifyConfig) -> Self {
        Registration::Config(config)
    }
}

impl From<Rule> for Registration {
    fn from(rule: Rule) -> Self {
        Registration::Rule(rule)
    }
}

/// Compiles rules into triggers bound to the current configuration.
///
/// ```
/// use integrify_engine::{Integrify, IntegrifyConfig};
/// use integrify_model::{DeleteReferencesRule, DeleteTarget, Rule};
/// use integrify_store::MemoryStore;
/// use std::sync::Arc;
///
/// let mut integrify = Integrify::new();
/// integrify.integrify(IntegrifyConfig::new(Arc::new(MemoryStore::new()))).unwrap();
///
/// let rule: Rule = DeleteReferencesRule::new("master")
///     .target(DeleteTarget::new("detail1", "masterId"))
///     .into();
/// let trigger = integrify.integrify(rule).unwrap().unwrap();
/// assert_eq!(trigger.document_pattern, "master/{masterId}");
/// ```
#[derive(Debug, Default)]
pub struct Integrify {
    config: Option<Arc<IntegrifyConfig>>,
}

impl Integrify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configured(config: IntegrifyConfig) -> Self {
        Self {
            config: Some(Arc::new(config)),
        }
    }

    /// Replaces the configuration. Triggers compiled earlier keep the one
    /// they were compiled with.
    pub fn configure(&mut self, config: IntegrifyConfig) {
        debug!("integrify: Configured with {config:?}");
        self.config = Some(Arc::new(config));
    }

    pub fn config(&self) -> Option<&IntegrifyConfig> {
        self.config.as_deref()
    }

    /// Stores a configuration (returning `None`) or compiles a rule.
    pub fn integrify(
        &mut self,
        registration: impl Into<Registration>,
    ) -> IntegrifyResult<Option<CompiledTrigger>> {
        match registration.into() {
            Registration::Config(config) => {
                self.configure(config);
                Ok(None)
            }
            Registration::Rule(rule) => self.compile(rule).map(Some),
        }
    }

    /// Registers a definition from its JSON form.
    ///
    /// A `{"config": {...}}` object updates the options of the current
    /// configuration; the store handle can only be supplied from code.
    pub fn integrify_json(&mut self, value: &Value) -> IntegrifyResult<Option<CompiledTrigger>> {
        match Definition::from_json(value)? {
            Definition::Rule(rule) => self.compile(rule).map(Some),
            Definition::Config(options) => {
                let current = self.config.as_deref().ok_or(IntegrifyError::NotConfigured)?;
                let next = current.clone().with_options(options);
                self.configure(next);
                Ok(None)
            }
        }
    }

    /// Compiles one rule against the current configuration.
    pub fn compile(&self, rule: Rule) -> IntegrifyResult<CompiledTrigger> {
        let config = self.config.clone().ok_or(IntegrifyError::NotConfigured)?;
        let name = rule.name();
        let pattern = rule.document_pattern();

        let (event, handler): (TriggerEvent, Arc<dyn TriggerHandler>) = match rule {
            Rule::ReplicateAttributes(rule) => {
                for target in &rule.targets {
                    for (source, dest) in &target.attribute_mapping {
                        debug!(
                            "integrify: Replicating [{}].[{source}] => [{}].[{dest}]",
                            rule.source.collection, target.collection
                        );
                    }
                }
                let handler = ReplicateHandler {
                    rule,
                    pattern: pattern.clone(),
                    config,
                };
                (TriggerEvent::OnUpdate, Arc::new(handler) as Arc<dyn TriggerHandler>)
            }
            Rule::DeleteReferences(rule) => {
                for target in &rule.targets {
                    debug!(
                        "integrify: Delete references to [{}] from [{}] linked by key [{}]",
                        rule.source.collection,
                        target.collection,
                        target.foreign_key.as_deref().unwrap_or_default()
                    );
                }
                let handler = DeleteHandler {
                    rule,
                    pattern: pattern.clone(),
                    config,
                };
                (TriggerEvent::OnDelete, Arc::new(handler) as Arc<dyn TriggerHandler>)
            }
            Rule::MaintainCount(rule) => {
                debug!(
                    "integrify: Maintain count of [{}] into [{}].[{}]",
                    rule.source.collection, rule.target.collection, rule.target.attribute
                );
                let handler = CountHandler { rule, config };
                (TriggerEvent::OnWrite, Arc::new(handler) as Arc<dyn TriggerHandler>)
            }
        };

        info!("integrify: Compiled [{name}] on [{pattern}] ({event})");
        Ok(CompiledTrigger {
            name,
            document_pattern: pattern,
            event,
            handler,
        })
    }
}

//! The declarative JSON surface.
//!
//! A definition is either a rule object (`{"rule": "DELETE_REFERENCES", ...}`)
//! or a configuration object (`{"config": {...}}`). The two shapes are told
//! apart by which of the two keys is present; anything else is rejected
//! before it reaches a rule compiler.

use crate::error::{ModelError, ModelResult};
use crate::rule::{Rule, RuleKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options carried by a configuration object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOptions {
    /// Log every per-document operation, not just per-invocation summaries.
    #[serde(default)]
    pub verbose: bool,
}

/// One parsed definition.
#[derive(Debug, Clone)]
pub enum Definition {
    Rule(Rule),
    Config(ConfigOptions),
}

impl Definition {
    /// Classifies and parses a single JSON object.
    pub fn from_json(value: &Value) -> ModelResult<Self> {
        let object = value.as_object().ok_or(ModelError::NotARuleOrConfig)?;

        match (object.get("rule"), object.get("config")) {
            (Some(_), Some(_)) => Err(ModelError::AmbiguousDefinition),
            (Some(tag), None) => {
                let tag_text = match tag {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                let kind: RuleKind = tag_text.parse().map_err(ModelError::UnknownRuleKind)?;
                let rule = serde_json::from_value(value.clone())
                    .map_err(|source| ModelError::InvalidRule { kind, source })?;
                Ok(Definition::Rule(rule))
            }
            (None, Some(config)) => {
                let options =
                    serde_json::from_value(config.clone()).map_err(ModelError::InvalidConfig)?;
                Ok(Definition::Config(options))
            }
            (None, None) => Err(ModelError::NotARuleOrConfig),
        }
    }

    /// Parses a JSON array of definitions, or a single definition object.
    pub fn list_from_json(value: &Value) -> ModelResult<Vec<Self>> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_json).collect(),
            other => Ok(vec![Self::from_json(other)?]),
        }
    }
}

impl From<Rule> for Definition {
    fn from(rule: Rule) -> Self {
        Definition::Rule(rule)
    }
}

use crate::handler::{CountHooks, Hook, Hooks, KeyFormatter};
use crate::template::normalize_source;
use indexmap::IndexMap;
use integrify_types::{Change, DocumentSnapshot};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Route parameter bound to the written document's id on count triggers.
pub const COUNT_DOCUMENT_KEY: &str = "docId";

/// Discriminant of a [`Rule`], as written in the `rule` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKind {
    ReplicateAttributes,
    DeleteReferences,
    MaintainCount,
}

impl RuleKind {
    pub const ALL: [RuleKind; 3] = [
        RuleKind::ReplicateAttributes,
        RuleKind::DeleteReferences,
        RuleKind::MaintainCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::ReplicateAttributes => "REPLICATE_ATTRIBUTES",
            RuleKind::DeleteReferences => "DELETE_REFERENCES",
            RuleKind::MaintainCount => "MAINTAIN_COUNT",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

/// A declarative propagation rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rule {
    ReplicateAttributes(ReplicateAttributesRule),
    DeleteReferences(DeleteReferencesRule),
    MaintainCount(MaintainCountRule),
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::ReplicateAttributes(_) => RuleKind::ReplicateAttributes,
            Rule::DeleteReferences(_) => RuleKind::DeleteReferences,
            Rule::MaintainCount(_) => RuleKind::MaintainCount,
        }
    }

    /// The source collection pattern as written.
    pub fn source_collection(&self) -> &str {
        match self {
            Rule::ReplicateAttributes(r) => &r.source.collection,
            Rule::DeleteReferences(r) => &r.source.collection,
            Rule::MaintainCount(r) => &r.source.collection,
        }
    }

    /// The explicit name, or `<KIND>:<source collection>`.
    pub fn name(&self) -> String {
        let explicit = match self {
            Rule::ReplicateAttributes(r) => r.name.as_deref(),
            Rule::DeleteReferences(r) => r.name.as_deref(),
            Rule::MaintainCount(r) => r.name.as_deref(),
        };
        explicit
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}:{}", self.kind(), self.source_collection()))
    }

    /// The document pattern this rule's trigger is bound to.
    ///
    /// Count sources name a collection, so every document in it matches.
    pub fn document_pattern(&self) -> String {
        match self {
            Rule::MaintainCount(r) => format!(
                "{}/{{{COUNT_DOCUMENT_KEY}}}",
                r.source.collection.trim_end_matches('/')
            ),
            _ => normalize_source(self.source_collection()),
        }
    }
}

impl From<ReplicateAttributesRule> for Rule {
    fn from(rule: ReplicateAttributesRule) -> Self {
        Rule::ReplicateAttributes(rule)
    }
}

impl From<DeleteReferencesRule> for Rule {
    fn from(rule: DeleteReferencesRule) -> Self {
        Rule::DeleteReferences(rule)
    }
}

impl From<MaintainCountRule> for Rule {
    fn from(rule: MaintainCountRule) -> Self {
        Rule::MaintainCount(rule)
    }
}

/// Source side of replicate and delete rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpec {
    /// Path pattern, e.g. `master/{masterId}`.
    pub collection: String,
}

// ── REPLICATE_ATTRIBUTES ─────────────────────────────────────────

/// Copies source attributes into every target document referencing the
/// source through a foreign key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateAttributesRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: SourceSpec,
    pub targets: Vec<ReplicateTarget>,
    #[serde(skip)]
    pub hooks: Hooks<Change>,
}

impl ReplicateAttributesRule {
    pub fn new(source_collection: impl Into<String>) -> Self {
        Self {
            name: None,
            source: SourceSpec {
                collection: source_collection.into(),
            },
            targets: Vec::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target: ReplicateTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn pre(mut self, hook: impl Hook<Change> + 'static) -> Self {
        self.hooks = self.hooks.with_pre(hook);
        self
    }

    pub fn post(mut self, hook: impl Hook<Change> + 'static) -> Self {
        self.hooks = self.hooks.with_post(hook);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicateTarget {
    /// Collection path or collection-group id; may contain `$` tokens.
    pub collection: String,
    pub foreign_key: String,
    /// Source field name → target field name, in declaration order.
    pub attribute_mapping: IndexMap<String, String>,
    #[serde(default)]
    pub is_collection_group: bool,
}

impl ReplicateTarget {
    pub fn new(collection: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            foreign_key: foreign_key.into(),
            attribute_mapping: IndexMap::new(),
            is_collection_group: false,
        }
    }

    /// Adds `source_attribute → target_attribute` to the mapping.
    pub fn map(mut self, source_attribute: impl Into<String>, target_attribute: impl Into<String>) -> Self {
        self.attribute_mapping
            .insert(source_attribute.into(), target_attribute.into());
        self
    }

    pub fn collection_group(mut self) -> Self {
        self.is_collection_group = true;
        self
    }
}

// ── DELETE_REFERENCES ────────────────────────────────────────────

/// Deletes target documents that reference a deleted source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteReferencesRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: SourceSpec,
    pub targets: Vec<DeleteTarget>,
    #[serde(skip)]
    pub hooks: Hooks<DocumentSnapshot>,
}

impl DeleteReferencesRule {
    pub fn new(source_collection: impl Into<String>) -> Self {
        Self {
            name: None,
            source: SourceSpec {
                collection: source_collection.into(),
            },
            targets: Vec::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn target(mut self, target: DeleteTarget) -> Self {
        self.targets.push(target);
        self
    }

    pub fn pre(mut self, hook: impl Hook<DocumentSnapshot> + 'static) -> Self {
        self.hooks = self.hooks.with_pre(hook);
        self
    }

    pub fn post(mut self, hook: impl Hook<DocumentSnapshot> + 'static) -> Self {
        self.hooks = self.hooks.with_post(hook);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteTarget {
    /// Collection path or collection-group id; may contain `$` tokens.
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
    #[serde(default)]
    pub is_collection_group: bool,
    /// Delete every document of the target, ignoring the foreign key.
    #[serde(default)]
    pub delete_all: bool,
}

impl DeleteTarget {
    /// Target filtered by `foreign_key == <source primary key>`.
    pub fn new(collection: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            foreign_key: Some(foreign_key.into()),
            ..Default::default()
        }
    }

    /// Target whose documents are all deleted.
    pub fn all(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            delete_all: true,
            ..Default::default()
        }
    }

    pub fn collection_group(mut self) -> Self {
        self.is_collection_group = true;
        self
    }
}

// ── MAINTAIN_COUNT ───────────────────────────────────────────────

/// Keeps a numeric attribute on a target document equal to the number of
/// source documents referencing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintainCountRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub source: CountSource,
    pub target: CountTarget,
    #[serde(skip)]
    pub hooks: CountHooks,
}

impl MaintainCountRule {
    pub fn new(
        source_collection: impl Into<String>,
        target_collection: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            source: CountSource {
                collection: source_collection.into(),
                foreign_key: None,
            },
            target: CountTarget {
                collection: target_collection.into(),
                attribute: attribute.into(),
            },
            hooks: CountHooks::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Source field holding the target document id, for targets written
    /// as a plain collection (`articles`) instead of a template
    /// (`articles/$source.articleId`).
    pub fn foreign_key(mut self, field: impl Into<String>) -> Self {
        self.source.foreign_key = Some(field.into());
        self
    }

    pub fn pre(mut self, format_key: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        self.hooks.pre = Some(KeyFormatter::new(format_key));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountSource {
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountTarget {
    /// Target document template, e.g. `articles/$source.articleId`.
    pub collection: String,
    pub attribute: String,
}

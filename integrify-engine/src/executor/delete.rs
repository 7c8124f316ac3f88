use super::{group_label, primary_key_value, run_hook, target_query};
use crate::classifier::validate_delete_target;
use crate::config::IntegrifyConfig;
use crate::error::{HookPhase, IntegrifyResult};
use integrify_model::DeleteReferencesRule;
use integrify_model::template::resolve_dynamic_tokens;
use integrify_store::WriteBatch;
use integrify_types::{DocumentSnapshot, EventContext};
use serde_json::Value;
use tracing::debug;

/// Deletes every target document that references a deleted source
/// document, or every target document when the target sets `deleteAll`.
pub async fn delete_references(
    rule: &DeleteReferencesRule,
    pattern: &str,
    config: &IntegrifyConfig,
    deleted: &DocumentSnapshot,
    ctx: &EventContext,
) -> IntegrifyResult<()> {
    let (key, key_value) = primary_key_value(pattern, ctx)?;
    for target in &rule.targets {
        validate_delete_target(target)?;
    }
    debug!(
        "integrify: Detected delete in [{}], {key} [{key_value}]",
        rule.source.collection
    );

    run_hook(rule.hooks.pre.as_ref(), HookPhase::Pre, deleted, ctx).await?;

    let token_fields = ctx.token_fields(Some(&deleted.data));
    for target in &rule.targets {
        let collection =
            resolve_dynamic_tokens(&token_fields, &target.collection, None)?.target_collection;
        let mut query = target_query(&collection, target.is_collection_group)?;
        match (&target.foreign_key, target.delete_all) {
            (Some(foreign_key), false) => {
                debug!(
                    "integrify: Deleting docs in {} [{collection}] where [{foreign_key}] matches [{key_value}]",
                    group_label(target.is_collection_group)
                );
                query = query.where_eq(foreign_key.as_str(), Value::String(key_value.clone()));
            }
            _ => debug!(
                "integrify: Deleting all docs in {} [{collection}]",
                group_label(target.is_collection_group)
            ),
        }

        let matches = config.store.query(&query).await?;
        let mut batch = WriteBatch::new();
        for doc in matches {
            if config.verbose() {
                debug!("integrify: Deleting [{}]", doc.path);
            }
            batch.delete(doc.path);
        }
        if batch.is_empty() {
            continue;
        }
        config.store.commit(batch).await?;
    }

    run_hook(rule.hooks.post.as_ref(), HookPhase::Post, deleted, ctx).await
}

use super::{group_label, primary_key_value, run_hook, target_query};
use crate::classifier::{is_relevant, tracked_attributes};
use crate::config::IntegrifyConfig;
use crate::error::{HookPhase, IntegrifyError, IntegrifyResult};
use integrify_model::template::resolve_dynamic_tokens;
use integrify_model::{ReplicateAttributesRule, ReplicateTarget};
use integrify_store::{FieldUpdate, UpdateMap, WriteBatch};
use integrify_types::{Change, EventContext, Fields, is_truthy};
use serde_json::Value;
use tracing::debug;

/// Projects `after` through a target's attribute mapping. A falsy source
/// value removes the target field.
pub(crate) fn update_map(target: &ReplicateTarget, after: &Fields) -> UpdateMap {
    target
        .attribute_mapping
        .iter()
        .map(|(source, dest)| {
            let update = match after.get(source) {
                Some(value) if is_truthy(value) => FieldUpdate::Set(value.clone()),
                _ => FieldUpdate::Delete,
            };
            (dest.clone(), update)
        })
        .collect()
}

/// Copies mapped attributes of an updated source document onto every
/// target document whose foreign key equals the source's primary key.
pub async fn replicate_attributes(
    rule: &ReplicateAttributesRule,
    pattern: &str,
    config: &IntegrifyConfig,
    change: &Change,
    ctx: &EventContext,
) -> IntegrifyResult<()> {
    let (key, key_value) = primary_key_value(pattern, ctx)?;
    let after = change
        .after
        .as_ref()
        .ok_or(IntegrifyError::MissingSnapshot("after"))?;
    debug!(
        "integrify: Detected update in [{}], {key} [{key_value}]",
        rule.source.collection
    );

    run_hook(rule.hooks.pre.as_ref(), HookPhase::Pre, change, ctx).await?;

    if !is_relevant(rule, change) {
        debug!(
            "integrify: No relevant updates for [{}], tracked attributes {:?}",
            rule.source.collection,
            tracked_attributes(rule)
        );
        return Ok(());
    }

    let token_fields = ctx.token_fields(Some(&after.data));
    for target in &rule.targets {
        let collection =
            resolve_dynamic_tokens(&token_fields, &target.collection, None)?.target_collection;
        let update = update_map(target, &after.data);
        let query = target_query(&collection, target.is_collection_group)?
            .where_eq(target.foreign_key.as_str(), Value::String(key_value.clone()));

        let matches = config.store.query(&query).await?;
        let mut batch = WriteBatch::new();
        for doc in matches {
            if config.verbose() {
                debug!(
                    "integrify: On {} [{collection}], id [{}], applying update: {update:?}",
                    group_label(target.is_collection_group),
                    doc.id()
                );
            }
            batch.update(doc.path, update.clone());
        }

        if batch.is_empty() {
            debug!(
                "integrify: No documents in {} [{collection}] reference [{key_value}]",
                group_label(target.is_collection_group)
            );
            continue;
        }
        debug!(
            "integrify: Replicating {} field(s) to {} document(s) in [{collection}]",
            update.len(),
            batch.len()
        );
        config.store.commit(batch).await?;
    }

    run_hook(rule.hooks.post.as_ref(), HookPhase::Post, change, ctx).await
}

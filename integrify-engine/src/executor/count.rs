use crate::classifier::CountDelta;
use crate::config::IntegrifyConfig;
use crate::error::{IntegrifyError, IntegrifyResult};
use integrify_model::MaintainCountRule;
use integrify_model::template::resolve_dynamic_tokens;
use integrify_store::{FieldUpdate, UpdateMap, WriteBatch};
use integrify_types::{
    as_segment, Change, CollectionPath, DocumentPath, DocumentSnapshot, EventContext,
};
use tracing::{debug, warn};

/// Address of the counter document for one source snapshot.
///
/// Dynamic tokens in the target template are resolved against the snapshot
/// and route params. A template without tokens is a document path, unless
/// the rule keys its target on a source field, in which case that field's
/// value is the document id inside the target collection.
pub(crate) fn count_target(
    rule: &MaintainCountRule,
    snapshot: &DocumentSnapshot,
    ctx: &EventContext,
) -> IntegrifyResult<DocumentPath> {
    let formatter = rule.hooks.pre.as_ref();
    let format_key = formatter.map(|f| f.as_fn() as &dyn Fn(&str) -> String);
    let resolution = resolve_dynamic_tokens(
        &ctx.token_fields(Some(&snapshot.data)),
        &rule.target.collection,
        format_key,
    )?;

    match (&rule.source.foreign_key, resolution.has_fields) {
        (Some(foreign_key), false) => {
            let id = snapshot
                .get(foreign_key)
                .and_then(as_segment)
                .ok_or_else(|| IntegrifyError::MissingForeignKeyValue {
                    key: foreign_key.clone(),
                    path: snapshot.path.to_string(),
                })?;
            let id = match formatter {
                Some(f) => f.format(&id),
                None => id,
            };
            Ok(CollectionPath::parse(&resolution.target_collection)?.doc(&id)?)
        }
        _ => Ok(DocumentPath::parse(&resolution.target_collection)?),
    }
}

/// Applies `±1` to the counter attribute of the document a created or
/// deleted source document points at.
pub async fn maintain_count(
    rule: &MaintainCountRule,
    config: &IntegrifyConfig,
    change: &Change,
    ctx: &EventContext,
) -> IntegrifyResult<()> {
    let (delta, snapshot) = match (CountDelta::for_change(change), change.latest()) {
        (Some(delta), Some(snapshot)) => (delta, snapshot),
        _ => {
            warn!(
                "integrify: Ignoring update trigger for MAINTAIN_COUNT on collection [{}]",
                rule.source.collection
            );
            return Ok(());
        }
    };

    let target = count_target(rule, snapshot, ctx)?;
    if config.store.get(&target).await?.is_none() {
        warn!("integrify: Count target [{target}] does not exist, skipping");
        return Ok(());
    }

    let mut update = UpdateMap::new();
    update.insert(
        rule.target.attribute.clone(),
        FieldUpdate::Increment(delta.value()),
    );
    debug!(
        "integrify: Applying {delta:?} to [{target}].[{}]",
        rule.target.attribute
    );

    let mut batch = WriteBatch::new();
    batch.update(target, update);
    config.store.commit(batch).await?;
    Ok(())
}

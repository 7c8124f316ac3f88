//! Propagation: turns one rule and one change into queries and batched
//! writes against the configured store.
//!
//! Each target gets its own [`WriteBatch`](integrify_store::WriteBatch),
//! committed before the next target is queried. A failing target leaves
//! earlier targets committed and later ones unattempted.

mod count;
mod delete;
mod replicate;

pub use count::maintain_count;
pub use delete::delete_references;
pub use replicate::replicate_attributes;

use crate::error::{HookPhase, IntegrifyError, IntegrifyResult};
use integrify_model::Hook;
use integrify_model::template::primary_key;
use integrify_store::{Query, StoreResult};
use integrify_types::{CollectionPath, EventContext};
use std::sync::Arc;

/// The route parameter named by `pattern`'s primary key, and its value.
pub(crate) fn primary_key_value(
    pattern: &str,
    ctx: &EventContext,
) -> IntegrifyResult<(String, String)> {
    let key = primary_key(pattern).primary_key;
    match ctx.param(&key) {
        Some(value) if !value.is_empty() => Ok((key, value.to_string())),
        _ => Err(IntegrifyError::MissingPrimaryKey { key }),
    }
}

/// Query over a resolved target collection, or collection group.
pub(crate) fn target_query(collection: &str, is_collection_group: bool) -> StoreResult<Query> {
    if is_collection_group {
        Query::collection_group(collection)
    } else {
        Ok(Query::collection(CollectionPath::parse(collection)?))
    }
}

pub(crate) async fn run_hook<T: Sync + ?Sized>(
    hook: Option<&Arc<dyn Hook<T>>>,
    phase: HookPhase,
    input: &T,
    ctx: &EventContext,
) -> IntegrifyResult<()> {
    let Some(hook) = hook else {
        return Ok(());
    };
    hook.run(input, ctx)
        .await
        .map_err(|message| IntegrifyError::Hook { phase, message })
}

fn group_label(is_collection_group: bool) -> &'static str {
    if is_collection_group { "collection group" } else { "collection" }
}

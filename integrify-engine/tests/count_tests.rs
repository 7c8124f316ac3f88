use integrify_engine::{CompiledTrigger, Integrify, IntegrifyConfig, IntegrifyError};
use integrify_model::{MaintainCountRule, TemplateError};
use integrify_store::MemoryStore;
use integrify_types::{Change, DocumentPath, DocumentSnapshot, EventContext, Fields};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

fn make_snapshot(path: &str, data: Value) -> DocumentSnapshot {
    let data: Fields = serde_json::from_value(data).unwrap();
    DocumentSnapshot::new(DocumentPath::parse(path).unwrap(), data)
}

fn make_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::from_json(&json!({
            "articles/a1": {"title": "one", "favoritesCount": 0},
            "articles/a2": {"title": "two"},
            "articles/updated_a1": {"favoritesCount": 10}
        }))
        .unwrap(),
    )
}

fn make_rule() -> MaintainCountRule {
    MaintainCountRule::new("favorites", "articles/$source.articleId", "favoritesCount")
}

fn make_trigger(store: &Arc<MemoryStore>, rule: MaintainCountRule) -> CompiledTrigger {
    Integrify::configured(IntegrifyConfig::new(store.clone()))
        .compile(rule.into())
        .unwrap()
}

fn favorite(id: &str, article: &str) -> DocumentSnapshot {
    make_snapshot(&format!("favorites/{id}"), json!({"articleId": article}))
}

async fn count(store: &MemoryStore, path: &str) -> Value {
    store.document(path).await.unwrap()["favoritesCount"].clone()
}

// ── Create & delete ──────────────────────────────────────────────

#[tokio::test]
async fn create_increments_target() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    trigger
        .invoke(&Change::created(favorite("f1", "a1")), &EventContext::default())
        .await
        .unwrap();

    assert_eq!(count(&store, "articles/a1").await, json!(1));
}

#[tokio::test]
async fn missing_attribute_starts_from_zero() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    trigger
        .invoke(&Change::deleted(favorite("f1", "a2")), &EventContext::default())
        .await
        .unwrap();

    assert_eq!(count(&store, "articles/a2").await, json!(-1));
}

#[tokio::test]
async fn creates_and_deletes_net_out() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());
    let ctx = EventContext::default();

    for i in 0..5 {
        let change = Change::created(favorite(&format!("f{i}"), "a1"));
        trigger.invoke(&change, &ctx).await.unwrap();
    }
    for i in 0..2 {
        let change = Change::deleted(favorite(&format!("f{i}"), "a1"));
        trigger.invoke(&change, &ctx).await.unwrap();
    }

    assert_eq!(count(&store, "articles/a1").await, json!(3));
    assert_eq!(store.stats().commits, 7);
}

// ── No-ops ───────────────────────────────────────────────────────

#[tokio::test]
async fn update_changes_nothing() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    let change = Change::updated(favorite("f1", "a1"), favorite("f1", "a2"));
    trigger.invoke(&change, &EventContext::default()).await.unwrap();

    assert_eq!(store.stats().reads, 0);
    assert_eq!(store.stats().commits, 0);
    assert_eq!(count(&store, "articles/a1").await, json!(0));
}

#[tokio::test]
async fn missing_target_changes_nothing() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    trigger
        .invoke(&Change::created(favorite("f1", "a9")), &EventContext::default())
        .await
        .unwrap();

    assert_eq!(store.stats().reads, 1);
    assert_eq!(store.stats().commits, 0);
    assert_eq!(store.len().await, 3);
}

// ── Target resolution ────────────────────────────────────────────

#[tokio::test]
async fn pre_hook_reformats_key() {
    let store = make_store();
    let rule = make_rule().pre(|key| format!("updated_{key}"));
    let trigger = make_trigger(&store, rule);

    trigger
        .invoke(&Change::created(favorite("f1", "a1")), &EventContext::default())
        .await
        .unwrap();

    assert_eq!(count(&store, "articles/updated_a1").await, json!(11));
    assert_eq!(count(&store, "articles/a1").await, json!(0));
}

#[tokio::test]
async fn route_param_token_targets_parent() {
    let store = Arc::new(
        MemoryStore::from_json(&json!({"users/u1": {"postCount": 2}})).unwrap(),
    );
    let rule = MaintainCountRule::new("users/{userId}/posts", "users/$userId", "postCount");
    let trigger = make_trigger(&store, rule);
    assert_eq!(trigger.document_pattern, "users/{userId}/posts/{docId}");

    let ctx = EventContext::with_params([("userId", "u1"), ("docId", "p1")]);
    let change = Change::created(make_snapshot("users/u1/posts/p1", json!({})));
    trigger.invoke(&change, &ctx).await.unwrap();

    assert_eq!(store.document("users/u1").await.unwrap()["postCount"], json!(3));
}

#[tokio::test]
async fn legacy_foreign_key_addresses_target_collection() {
    let store = make_store();
    let rule = MaintainCountRule::new("favorites", "articles", "favoritesCount").foreign_key("articleId");
    let trigger = make_trigger(&store, rule);

    trigger
        .invoke(&Change::created(favorite("f1", "a1")), &EventContext::default())
        .await
        .unwrap();

    assert_eq!(count(&store, "articles/a1").await, json!(1));
}

#[tokio::test]
async fn legacy_foreign_key_missing_on_document_fails() {
    let store = make_store();
    let rule = MaintainCountRule::new("favorites", "articles", "favoritesCount").foreign_key("articleId");
    let trigger = make_trigger(&store, rule);

    let change = Change::created(make_snapshot("favorites/f1", json!({"other": 1})));
    let err = trigger.invoke(&change, &EventContext::default()).await.unwrap_err();

    assert!(matches!(
        &err,
        IntegrifyError::MissingForeignKeyValue { key, path } if key == "articleId" && path == "favorites/f1"
    ));
    assert_eq!(store.stats().reads, 0);
}

#[tokio::test]
async fn missing_token_value_fails() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    let change = Change::created(make_snapshot("favorites/f1", json!({"articleId": ""})));
    let err = trigger.invoke(&change, &EventContext::default()).await.unwrap_err();

    assert!(matches!(
        err,
        IntegrifyError::Template(TemplateError::MissingDynamicReference(ref token)) if token == "$source.articleId"
    ));
}

#[tokio::test]
async fn collection_target_without_key_is_invalid() {
    let store = make_store();
    let rule = MaintainCountRule::new("favorites", "articles", "favoritesCount");
    let trigger = make_trigger(&store, rule);

    let err = trigger
        .invoke(&Change::created(favorite("f1", "a1")), &EventContext::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IntegrifyError::Path(_)));
}

// ── Concurrency ──────────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_converge() {
    let store = make_store();
    let trigger = make_trigger(&store, make_rule());

    let handles: Vec<_> = (0..25)
        .map(|i| {
            let trigger = trigger.clone();
            tokio::spawn(async move {
                let change = Change::created(favorite(&format!("f{i}"), "a1"));
                trigger.invoke(&change, &EventContext::default()).await
            })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    assert_eq!(count(&store, "articles/a1").await, json!(25));
}

use integrify_engine::{
    ChangeKind, Integrify, IntegrifyConfig, IntegrifyError, TriggerEvent, TriggerRouter,
};
use integrify_model::{
    DeleteReferencesRule, DeleteTarget, MaintainCountRule, ReplicateAttributesRule,
    ReplicateTarget, Rule,
};
use integrify_store::MemoryStore;
use integrify_types::{Change, DocumentPath, DocumentSnapshot, Fields};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;

fn make_snapshot(path: &str, data: Value) -> DocumentSnapshot {
    let data: Fields = serde_json::from_value(data).unwrap();
    DocumentSnapshot::new(DocumentPath::parse(path).unwrap(), data)
}

fn path(p: &str) -> DocumentPath {
    DocumentPath::parse(p).unwrap()
}

fn make_store() -> Arc<MemoryStore> {
    Arc::new(
        MemoryStore::from_json(&json!({
            "master/m1": {"name": "one"},
            "detail1/d1": {"masterId": "m1"},
            "detail1/d2": {"masterId": "m2"},
            "articles/a1": {"favoritesCount": 0}
        }))
        .unwrap(),
    )
}

fn make_rules() -> Vec<Rule> {
    vec![
        ReplicateAttributesRule::new("master")
            .target(ReplicateTarget::new("detail1", "masterId").map("name", "masterName"))
            .into(),
        DeleteReferencesRule::new("master")
            .target(DeleteTarget::new("detail1", "masterId"))
            .into(),
        MaintainCountRule::new("favorites", "articles/$source.articleId", "favoritesCount").into(),
    ]
}

fn make_router(store: &Arc<MemoryStore>, rules: Vec<Rule>) -> TriggerRouter {
    let integrify = Integrify::configured(IntegrifyConfig::new(store.clone()));
    let mut router = TriggerRouter::new();
    for rule in rules {
        router.register(integrify.compile(rule).unwrap());
    }
    router
}

// ── Matching ─────────────────────────────────────────────────────

#[test]
fn event_filter() {
    assert!(TriggerEvent::OnWrite.accepts(ChangeKind::Update));
    assert!(TriggerEvent::OnDelete.accepts(ChangeKind::Delete));
    assert!(!TriggerEvent::OnDelete.accepts(ChangeKind::Create));
    assert!(!TriggerEvent::OnWrite.accepts(ChangeKind::NoOp));
}

#[test]
fn matching_binds_route_params() {
    let store = make_store();
    let router = make_router(&store, make_rules());

    let matched = router.matching(&path("master/m1"), ChangeKind::Update);
    assert_eq!(matched.len(), 1);
    let (trigger, params) = &matched[0];
    assert_eq!(trigger.name, "REPLICATE_ATTRIBUTES:master");
    assert_eq!(params.get("masterId").map(String::as_str), Some("m1"));

    assert!(router.matching(&path("other/m1"), ChangeKind::Update).is_empty());
    assert!(router.matching(&path("master/m1/sub/s1"), ChangeKind::Delete).is_empty());
}

// ── Dispatch ─────────────────────────────────────────────────────

#[tokio::test]
async fn update_fires_only_update_triggers() {
    let store = make_store();
    let router = make_router(&store, make_rules());

    let change = Change::updated(
        make_snapshot("master/m1", json!({"name": "one"})),
        make_snapshot("master/m1", json!({"name": "uno"})),
    );
    let outcomes = router.dispatch(&path("master/m1"), &change).await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_ok());
    assert_eq!(store.document("detail1/d1").await.unwrap()["masterName"], json!("uno"));
    assert!(!store.document("detail1/d2").await.unwrap().contains_key("masterName"));
}

#[tokio::test]
async fn delete_fires_delete_triggers() {
    let store = make_store();
    let router = make_router(&store, make_rules());

    let change = Change::deleted(make_snapshot("master/m1", json!({"name": "one"})));
    let outcomes = router.dispatch(&path("master/m1"), &change).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].trigger, "DELETE_REFERENCES:master");
    assert!(store.document("detail1/d1").await.is_none());
    assert!(store.document("detail1/d2").await.is_some());
}

#[tokio::test]
async fn write_triggers_fire_on_every_kind() {
    let store = make_store();
    let router = make_router(&store, make_rules());
    let fav = || make_snapshot("favorites/f1", json!({"articleId": "a1"}));

    let created = router.dispatch(&path("favorites/f1"), &Change::created(fav())).await;
    let updated = router
        .dispatch(&path("favorites/f1"), &Change::updated(fav(), fav()))
        .await;
    assert_eq!(created.len(), 1);
    assert_eq!(updated.len(), 1);
    assert!(updated[0].is_ok());
    assert_eq!(store.document("articles/a1").await.unwrap()["favoritesCount"], json!(1));
}

#[tokio::test]
async fn no_op_change_fires_nothing() {
    let store = make_store();
    let router = make_router(&store, make_rules());
    let outcomes = router.dispatch(&path("master/m1"), &Change::default()).await;
    assert!(outcomes.is_empty());
}

#[tokio::test]
async fn failing_trigger_does_not_stop_others() {
    let store = make_store();
    let broken: Rule = DeleteReferencesRule::new("master")
        .named("broken")
        .target(DeleteTarget {
            collection: "detail1".to_string(),
            ..Default::default()
        })
        .into();
    let working: Rule = DeleteReferencesRule::new("master")
        .named("working")
        .target(DeleteTarget::new("detail1", "masterId"))
        .into();
    let router = make_router(&store, vec![broken, working]);

    let change = Change::deleted(make_snapshot("master/m1", json!({})));
    let outcomes = router.dispatch(&path("master/m1"), &change).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].trigger, "broken");
    assert!(matches!(outcomes[0].result, Err(IntegrifyError::MissingForeignKey { .. })));
    assert_eq!(outcomes[1].trigger, "working");
    assert!(outcomes[1].is_ok());
    assert!(store.document("detail1/d1").await.is_none());
}

#[tokio::test]
async fn nested_pattern_binds_every_param() {
    let store = Arc::new(
        MemoryStore::from_json(&json!({
            "users/u1/posts/p1/comments/c1": {"postId": "p1"},
            "users/u1/posts/p1/comments/c2": {"postId": "p2"}
        }))
        .unwrap(),
    );
    let rule: Rule = DeleteReferencesRule::new("users/{userId}/posts/{postId}")
        .target(DeleteTarget::new("users/$userId/posts/$postId/comments", "postId"))
        .into();
    let router = make_router(&store, vec![rule]);

    let change = Change::deleted(make_snapshot("users/u1/posts/p1", json!({})));
    let outcomes = router.dispatch(&path("users/u1/posts/p1"), &change).await;

    assert!(outcomes[0].is_ok());
    assert_eq!(store.len().await, 1);
    assert!(store.document("users/u1/posts/p1/comments/c2").await.is_some());
}

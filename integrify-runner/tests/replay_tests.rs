use integrify_runner::{Replay, ReplayEvent, ReplaySummary, load_json, parse_events};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Write;
use tempfile::NamedTempFile;

fn make_file(value: &Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{value}").unwrap();
    file
}

fn make_rules() -> Value {
    json!([
        {"config": {"verbose": true}},
        {
            "rule": "REPLICATE_ATTRIBUTES",
            "source": {"collection": "master"},
            "targets": [{
                "collection": "detail1",
                "foreignKey": "masterId",
                "attributeMapping": {"name": "masterName"}
            }]
        },
        {
            "rule": "DELETE_REFERENCES",
            "source": {"collection": "master"},
            "targets": [{"collection": "detail1", "foreignKey": "masterId"}]
        },
        {
            "rule": "MAINTAIN_COUNT",
            "source": {"collection": "favorites"},
            "target": {"collection": "articles/$source.articleId", "attribute": "favoritesCount"}
        }
    ])
}

fn make_seed() -> Value {
    json!({
        "master/m1": {"name": "one"},
        "master/m2": {"name": "two"},
        "detail1/d1": {"masterId": "m1"},
        "detail1/d2": {"masterId": "m2"},
        "articles/a1": {"favoritesCount": 0}
    })
}

fn event(value: Value) -> ReplayEvent {
    serde_json::from_value(value).unwrap()
}

// ── Files ────────────────────────────────────────────────────────

#[test]
fn load_json_reads_file() {
    let file = make_file(&make_seed());
    assert_eq!(load_json(file.path()).unwrap(), make_seed());
}

#[test]
fn load_json_reports_path_on_parse_error() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{{not json").unwrap();
    let err = load_json(file.path()).unwrap_err();
    assert!(err.to_string().starts_with("failed to parse"));
}

#[test]
fn load_json_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_json(&dir.path().join("missing.json")).unwrap_err();
    assert!(err.to_string().starts_with("failed to read"));
}

#[test]
fn events_parse_with_optional_sides() {
    let events = parse_events(json!([
        {"path": "master/m1", "after": {"name": "x"}},
        {"path": "master/m2", "before": {"name": "two"}, "after": null}
    ]))
    .unwrap();
    assert_eq!(events.len(), 2);
    assert!(events[0].before.is_none());
    assert!(events[1].after.is_none());
    assert!(parse_events(json!({"path": "master/m1"})).is_err());
}

// ── Registration ─────────────────────────────────────────────────

#[test]
fn registers_one_trigger_per_rule() {
    let replay = Replay::new(&make_rules(), None, false).unwrap();
    assert_eq!(replay.router().len(), 3);
}

#[test]
fn invalid_definition_names_its_index() {
    let rules = json!([{"config": {}}, {"rule": "NOPE"}]);
    let err = Replay::new(&rules, None, false).err().unwrap();
    assert_eq!(err.to_string(), "invalid definition at index 1");
}

// ── Replay ───────────────────────────────────────────────────────

#[tokio::test]
async fn replays_updates_deletes_and_counts() {
    let replay = Replay::new(&make_rules(), Some(&make_seed()), false).unwrap();
    let events = vec![
        event(json!({"path": "master/m1", "after": {"name": "uno"}})),
        event(json!({"path": "master/m2"})),
        event(json!({"path": "favorites/f1", "after": {"articleId": "a1"}})),
        event(json!({"path": "favorites/f2", "after": {"articleId": "a1"}})),
    ];

    let summary = replay.run(&events).await.unwrap();

    assert_eq!(
        summary,
        ReplaySummary {
            events: 4,
            fired: 4,
            failed: 0
        }
    );
    assert_eq!(
        replay.store().to_json().await,
        json!({
            "articles/a1": {"favoritesCount": 2},
            "detail1/d1": {"masterId": "m1", "masterName": "uno"},
            "favorites/f1": {"articleId": "a1"},
            "favorites/f2": {"articleId": "a1"},
            "master/m1": {"name": "uno"}
        })
    );
}

#[tokio::test]
async fn explicit_before_overrides_store_state() {
    let replay = Replay::new(&make_rules(), Some(&make_seed()), false).unwrap();
    let outcomes = replay
        .apply(&event(json!({
            "path": "master/m1",
            "before": {"name": "uno"},
            "after": {"name": "uno"}
        })))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(!replay.store().document("detail1/d1").await.unwrap().contains_key("masterName"));
}

#[tokio::test]
async fn failed_triggers_are_counted() {
    let rules = json!([{
        "rule": "MAINTAIN_COUNT",
        "source": {"collection": "favorites"},
        "target": {"collection": "articles/$source.articleId", "attribute": "n"}
    }]);
    let replay = Replay::new(&rules, None, false).unwrap();
    let summary = replay
        .run(&[event(json!({"path": "favorites/f1", "after": {}}))])
        .await
        .unwrap();
    assert_eq!(summary.failed, 1);
}

#[tokio::test]
async fn invalid_event_path_is_an_error() {
    let replay = Replay::new(&make_rules(), None, false).unwrap();
    let err = replay.apply(&event(json!({"path": "master"}))).await.unwrap_err();
    assert_eq!(err.to_string(), "invalid event path [master]");
}

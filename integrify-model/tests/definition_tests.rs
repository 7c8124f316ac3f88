use integrify_model::{ConfigOptions, Definition, ModelError, RuleKind};
use serde_json::json;

#[test]
fn rule_object_is_a_rule() {
    let def = Definition::from_json(&json!({
        "rule": "DELETE_REFERENCES",
        "source": {"collection": "master"},
        "targets": [{"collection": "detail1", "foreignKey": "masterId"}]
    }))
    .unwrap();
    match def {
        Definition::Rule(rule) => assert_eq!(rule.kind(), RuleKind::DeleteReferences),
        Definition::Config(_) => panic!("expected a rule"),
    }
}

#[test]
fn config_object_is_a_config() {
    let def = Definition::from_json(&json!({"config": {"verbose": true}})).unwrap();
    match def {
        Definition::Config(options) => assert_eq!(options, ConfigOptions { verbose: true }),
        Definition::Rule(_) => panic!("expected a config"),
    }
}

#[test]
fn empty_config_uses_defaults() {
    let def = Definition::from_json(&json!({"config": {}})).unwrap();
    assert!(matches!(def, Definition::Config(ConfigOptions { verbose: false })));
}

#[test]
fn unknown_rule_kind_is_rejected() {
    let err = Definition::from_json(&json!({"rule": "TODO", "source": {"collection": "x"}}))
        .unwrap_err();
    assert!(matches!(err, ModelError::UnknownRuleKind(ref tag) if tag == "TODO"));
    assert_eq!(err.to_string(), "integrify: unknown rule kind [TODO]");
}

#[test]
fn non_string_rule_tag_is_unknown() {
    let err = Definition::from_json(&json!({"rule": 3})).unwrap_err();
    assert!(matches!(err, ModelError::UnknownRuleKind(ref tag) if tag == "3"));
}

#[test]
fn neither_shape_is_rejected() {
    let err = Definition::from_json(&json!({"source": {"collection": "x"}})).unwrap_err();
    assert!(matches!(err, ModelError::NotARuleOrConfig));

    let err = Definition::from_json(&json!("REPLICATE_ATTRIBUTES")).unwrap_err();
    assert!(matches!(err, ModelError::NotARuleOrConfig));
}

#[test]
fn both_shapes_are_rejected() {
    let err = Definition::from_json(&json!({"rule": "MAINTAIN_COUNT", "config": {}})).unwrap_err();
    assert!(matches!(err, ModelError::AmbiguousDefinition));
}

#[test]
fn malformed_rule_reports_kind() {
    let err = Definition::from_json(&json!({"rule": "MAINTAIN_COUNT", "source": {"collection": "x"}}))
        .unwrap_err();
    assert!(matches!(
        err,
        ModelError::InvalidRule { kind: RuleKind::MaintainCount, .. }
    ));
}

#[test]
fn malformed_config_is_rejected() {
    let err = Definition::from_json(&json!({"config": {"verbose": "yes"}})).unwrap_err();
    assert!(matches!(err, ModelError::InvalidConfig(_)));
}

#[test]
fn list_accepts_array_and_single_object() {
    let defs = Definition::list_from_json(&json!([
        {"config": {"verbose": false}},
        {
            "rule": "MAINTAIN_COUNT",
            "source": {"collection": "favorites"},
            "target": {"collection": "articles/$source.articleId", "attribute": "favoritesCount"}
        }
    ]))
    .unwrap();
    assert_eq!(defs.len(), 2);

    let single = Definition::list_from_json(&json!({"config": {}})).unwrap();
    assert_eq!(single.len(), 1);
}

#[test]
fn list_fails_on_first_bad_entry() {
    let err = Definition::list_from_json(&json!([{"config": {}}, {"rule": "NOPE"}])).unwrap_err();
    assert!(matches!(err, ModelError::UnknownRuleKind(_)));
}

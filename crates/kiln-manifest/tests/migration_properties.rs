//! Property tests for legacy rule migration.

use kiln_config::KilnConfig;
use kiln_manifest::{BehaviorKind, Phase, compile, migrate, migrate_rule};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn key() -> impl Strategy<Value = String> {
    let behavior_keys: Vec<String> = BehaviorKind::ALL.iter().map(|kind| kind.key().to_string()).collect();
    prop_oneof![
        prop::sample::select(behavior_keys),
        prop::sample::select(vec![
            "name".to_string(),
            "description".to_string(),
            "active".to_string(),
            "variable".to_string(),
        ]),
    ]
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        "[a-z/]{1,8}".prop_map(Value::String),
        Just(json!({ "path": "./f.js" })),
    ]
}

/// A rule with a `match` followed by an arbitrary mix of behavior and metadata keys.
fn rule() -> impl Strategy<Value = Value> {
    (
        "\\^/[a-z]{0,5}",
        prop::collection::vec((key(), scalar()), 0..8),
        any::<bool>(),
    )
        .prop_map(|(pattern, fields, nested)| {
            let mut map = Map::new();
            map.insert("match".to_string(), json!(pattern));
            if nested {
                map.insert("behavior".to_string(), json!({ "deliver": true }));
            }
            for (key, value) in fields {
                map.insert(key, value);
            }
            Value::Object(map)
        })
}

fn config() -> impl Strategy<Value = KilnConfig> {
    (
        prop::collection::vec(rule(), 0..5),
        prop::collection::vec(rule(), 0..5),
    )
        .prop_map(|(request, response)| {
            KilnConfig::from_value(json!({ "rules": { "request": request, "response": response } }))
                .expect("object config")
        })
}

proptest! {
    #[test]
    fn migration_is_idempotent(cfg in config()) {
        let once = migrate(&cfg);
        let twice = migrate(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn moved_keys_keep_relative_order(rule in rule()) {
        let migrated = migrate_rule(&rule, Phase::Request);
        let original_order: Vec<&String> = rule
            .as_object()
            .unwrap()
            .keys()
            .filter(|key| BehaviorKind::for_phase(key, Phase::Request).is_some())
            .filter(|key| *key != "deliver" || rule.get("behavior").is_none())
            .collect();

        let moved: Vec<&String> = migrated["behavior"]
            .as_object()
            .unwrap()
            .keys()
            .filter(|key| original_order.contains(key))
            .collect();
        prop_assert_eq!(moved, original_order);
    }

    #[test]
    fn compile_keeps_rule_order(cfg in config()) {
        let cfg = compilable(cfg);
        let migrated = migrate(&cfg);
        let manifest = compile(&cfg).expect("compile");

        for phase in Phase::ALL {
            let expected: Vec<&str> = migrated.get("rules").unwrap()[phase.as_str()]
                .as_array()
                .unwrap()
                .iter()
                .map(|rule| rule["match"].as_str().unwrap())
                .collect();
            let actual: Vec<&str> = manifest.rules.phase(phase).iter().map(|rule| rule.pattern()).collect();
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn compiled_rules_serialize_like_migrated_rules(cfg in config()) {
        let cfg = compilable(cfg);
        let migrated = migrate(&cfg);
        let manifest = compile(&cfg).expect("compile");

        // string comparison so key order counts
        let expected = serde_json::to_string(&migrated.get("rules").unwrap()).unwrap();
        let actual = serde_json::to_string(&manifest.rules).unwrap();
        prop_assert_eq!(actual, expected);
    }
}

/// Drops the generated fields that can make a rule invalid.
fn compilable(cfg: KilnConfig) -> KilnConfig {
    let mut value = cfg.into_value();
    for phase in ["request", "response"] {
        for rule in value["rules"][phase].as_array_mut().unwrap() {
            let fields = rule.as_object_mut().unwrap();
            fields.remove("setOrigin");
            if !matches!(fields.get("name"), Some(Value::String(_))) {
                fields.remove("name");
            }
        }
    }
    KilnConfig::from_value(value).unwrap()
}

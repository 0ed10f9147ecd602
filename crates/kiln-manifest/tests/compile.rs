//! End-to-end tests for manifest compilation.

use kiln_config::KilnConfig;
use kiln_manifest::{Manifest, ManifestError, compile, manifest_path, migrate, write_manifest};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;

fn config(value: Value) -> KilnConfig {
    KilnConfig::from_value(value).expect("object config")
}

#[test]
fn legacy_set_origin_compiles_to_behavior() {
    let manifest = compile(&config(json!({
        "origin": [{ "name": "o1", "type": "object_storage" }],
        "rules": { "request": [{ "match": "^/", "setOrigin": { "name": "o1" } }] }
    })))
    .expect("compile");

    let rule = serde_json::to_value(&manifest.rules.request[0]).unwrap();
    assert_eq!(rule, json!({ "match": "^/", "behavior": { "setOrigin": { "name": "o1" } } }));
}

#[test]
fn rule_keys_and_nulls_survive_compilation() {
    let cfg = config(json!({
        "rules": { "request": [{
            "description": "d",
            "match": "^/",
            "name": null,
            "deliver": true
        }] }
    }));

    let migrated = migrate(&cfg);
    let manifest = compile(&cfg).expect("compile");

    let expected = serde_json::to_string(&migrated.get("rules").unwrap()["request"][0]).unwrap();
    let actual = serde_json::to_string(&manifest.rules.request[0]).unwrap();
    assert_eq!(actual, expected);
    assert_eq!(actual, r#"{"description":"d","match":"^/","name":null,"behavior":{"deliver":true}}"#);
}

#[test]
fn preserves_rule_order_and_count() {
    let cfg = config(json!({
        "origin": [{ "name": "storage", "type": "object_storage", "bucket": "site" }],
        "rules": {
            "request": [
                { "name": "assets", "match": "^/_next", "setOrigin": { "name": "storage", "type": "object_storage" } },
                { "name": "api", "match": "^/api", "runFunction": { "path": "./functions/api.js" } },
                { "name": "fallback", "match": ".*", "behavior": { "deliver": true } }
            ],
            "response": [
                { "match": ".*", "enableGZIP": true }
            ]
        }
    }));

    let migrated = migrate(&cfg);
    let manifest = compile(&cfg).expect("compile");

    let migrated_matches: Vec<_> = migrated.get("rules").unwrap()["request"]
        .as_array()
        .unwrap()
        .iter()
        .map(|rule| rule["match"].as_str().unwrap().to_string())
        .collect();
    let compiled_matches: Vec<_> = manifest.rules.request.iter().map(|rule| rule.pattern().to_string()).collect();

    assert_eq!(compiled_matches, migrated_matches);
    assert_eq!(manifest.rules.response.len(), 1);
    assert_eq!(manifest.origin[0].extra["bucket"], "site");
}

#[test]
fn missing_origin_reference_is_rejected() {
    let err = compile(&config(json!({
        "rules": { "request": [{ "match": "^/", "setOrigin": { "name": "ghost" } }] }
    })))
    .unwrap_err();

    assert!(matches!(err, ManifestError::Validation(_)));
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn written_manifest_round_trips() {
    let dir = TempDir::new().unwrap();
    let manifest = compile(&config(json!({
        "origin": [{ "name": "o1", "type": "single_origin", "addresses": ["example.com"] }],
        "rules": { "request": [{ "match": "^/", "setOrigin": { "name": "o1" }, "forwardCookies": true }] }
    })))
    .unwrap();

    let path = manifest_path(dir.path(), None);
    write_manifest(&manifest, &path).unwrap();

    let written = fs::read_to_string(dir.path().join(".edge/manifest.json")).unwrap();
    let reloaded: Manifest = serde_json::from_str(&written).unwrap();
    assert_eq!(reloaded, manifest);
    assert!(written.contains("\n  \"rules\": {\n"));
}

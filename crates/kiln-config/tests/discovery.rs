//! Tests for config file discovery and loading

use kiln_config::{ConfigDiscovery, ConfigError, EntryPoints};
use std::fs;
use tempfile::TempDir;

#[test]
fn discovers_kiln_config_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("kiln.config.json"),
        r#"{
  "build": { "entry": "main.js", "preset": "javascript" },
  "rules": { "request": [{ "match": "^/", "runFunction": { "path": "./main.js" } }] }
}"#,
    )
    .unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    let found = discovery.find().unwrap();
    assert_eq!(found.file_name().unwrap(), "kiln.config.json");

    let config = discovery.load().unwrap();
    let build = config.build().unwrap();
    assert_eq!(build.entry, Some(EntryPoints::Single("main.js".to_string())));
    assert_eq!(config.preset_name(), Some("javascript"));
}

#[test]
fn discovers_kiln_config_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("kiln.config.toml"),
        r#"
[build]
preset = "typescript"
entry = ["src/index.ts"]
worker = true

[[origin]]
name = "assets"
type = "object_storage"
bucket = "my-bucket"
"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    let build = config.build().unwrap();
    assert!(build.worker_enabled());
    assert_eq!(build.first_entry(), Some("src/index.ts"));

    let origin = &config.get("origin").unwrap()[0];
    assert_eq!(origin["type"], "object_storage");
}

#[test]
fn toml_key_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("kiln.config.toml"),
        r#"
[[rules.request]]
match = "^/"
setHeaders = ["X-A: 1"]
deliver = true
bypassCache = true
"#,
    )
    .unwrap();

    let config = ConfigDiscovery::new(dir.path()).load().unwrap();
    let rule = config.get("rules").unwrap()["request"][0].as_object().unwrap();
    let keys: Vec<_> = rule.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["match", "setHeaders", "deliver", "bypassCache"]);
}

#[test]
fn discovers_package_json() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("package.json"),
        r#"{
  "name": "test",
  "kiln": {
    "build": { "preset": "react" }
  }
}"#,
    )
    .unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    assert_eq!(discovery.find().unwrap().file_name().unwrap(), "package.json");
    assert_eq!(discovery.load().unwrap().preset_name(), Some("react"));
}

#[test]
fn ignores_package_json_without_kiln_field() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("package.json"), r#"{ "name": "test" }"#).unwrap();

    let discovery = ConfigDiscovery::new(dir.path());
    assert!(discovery.find().is_none());
    assert!(discovery.try_load().unwrap().is_none());
}

#[test]
fn reports_invalid_json_with_hint() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("kiln.config.json"), "{ \"build\": ").unwrap();

    let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
    match err {
        ConfigError::InvalidValue { field, hint } => {
            assert_eq!(field, "kiln.config.json");
            assert!(hint.unwrap().contains("Invalid JSON"));
        }
        other => panic!("expected InvalidValue, got {other:?}"),
    }
}

#[test]
fn rejects_non_object_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("kiln.config.json"), "[1, 2, 3]").unwrap();

    let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { .. }));
}

#[test]
fn write_creates_pretty_json() {
    let dir = TempDir::new().unwrap();
    let discovery = ConfigDiscovery::new(dir.path());
    let config = kiln_config::KilnConfig::from_value(serde_json::json!({
        "build": { "preset": "vue", "polyfills": true }
    }))
    .unwrap();

    discovery.write(&config).unwrap();
    let written = fs::read_to_string(dir.path().join("kiln.config.json")).unwrap();
    assert!(written.starts_with("{\n  \"build\": {\n    \"preset\": \"vue\""));
    assert!(written.ends_with("}\n"));
}

//! Configuration → routing manifest.
//!
//! Compilation is pure: migrate legacy rules, validate the whole tree while
//! collecting every issue, then build the typed [`Manifest`]. Writing it to
//! disk lives in [`crate::writer`].

use std::collections::HashMap;

use kiln_config::{KilnConfig, ORIGIN_SECTION, RULES_SECTION};
use serde_json::{Map, Value};

use crate::behavior::{BehaviorKind, Phase};
use crate::error::{ManifestError, Result, ValidationIssue};
use crate::manifest::{Manifest, Origin, OriginType, Rule, RuleSet};
use crate::migrate::{BEHAVIOR_KEY, migrate};

/// Compile `config` into a manifest.
///
/// # Errors
///
/// Returns [`ManifestError::Validation`] listing every problem found.
pub fn compile(config: &KilnConfig) -> Result<Manifest> {
    let migrated = migrate(config);

    let mut issues = Vec::new();
    let origins = collect_origins(migrated.get(ORIGIN_SECTION), &mut issues);
    let rules = collect_rules(migrated.get(RULES_SECTION), &origins, &mut issues);

    if !issues.is_empty() {
        return Err(ManifestError::Validation(issues));
    }

    let manifest = Manifest {
        origin: origins,
        rules,
    };
    tracing::debug!(
        origins = manifest.origin.len(),
        request_rules = manifest.rules.request.len(),
        response_rules = manifest.rules.response.len(),
        "compiled manifest"
    );
    Ok(manifest)
}

fn collect_origins(section: Option<&Value>, issues: &mut Vec<ValidationIssue>) -> Vec<Origin> {
    let list = match section {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(list)) => list,
        Some(_) => {
            issues.push(ValidationIssue::new(ORIGIN_SECTION, "expected a list of origins"));
            return Vec::new();
        }
    };

    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut origins = Vec::with_capacity(list.len());

    for (index, raw) in list.iter().enumerate() {
        let path = format!("{ORIGIN_SECTION}[{index}]");
        let Value::Object(fields) = raw else {
            issues.push(ValidationIssue::new(path, "origin must be an object"));
            continue;
        };

        let name = match fields.get("name") {
            Some(Value::String(name)) if !name.is_empty() => Some(name.as_str()),
            _ => {
                issues.push(ValidationIssue::new(format!("{path}.name"), "must be a non-empty string"));
                None
            }
        };

        let kind = match fields.get("type") {
            Some(Value::String(kind)) => {
                let parsed = OriginType::parse(kind);
                if parsed.is_none() {
                    issues.push(ValidationIssue::new(
                        format!("{path}.type"),
                        format!("unknown origin type '{kind}'"),
                    ));
                }
                parsed
            }
            _ => {
                issues.push(ValidationIssue::new(format!("{path}.type"), "must be a string"));
                None
            }
        };

        let Some(name) = name else { continue };
        if let Some(first) = seen.get(name) {
            issues.push(ValidationIssue::new(
                format!("{path}.name"),
                format!("duplicate origin name '{name}' (first declared at {ORIGIN_SECTION}[{first}])"),
            ));
            continue;
        }
        seen.insert(name, index);

        let Some(kind) = kind else { continue };
        let extra: Map<String, Value> = fields
            .iter()
            .filter(|(key, _)| *key != "name" && *key != "type")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        origins.push(Origin {
            name: name.to_string(),
            kind,
            extra,
        });
    }

    origins
}

fn collect_rules(
    section: Option<&Value>,
    origins: &[Origin],
    issues: &mut Vec<ValidationIssue>,
) -> RuleSet {
    let mut rules = RuleSet::default();
    let sections = match section {
        None | Some(Value::Null) => return rules,
        Some(Value::Object(sections)) => sections,
        Some(_) => {
            issues.push(ValidationIssue::new(RULES_SECTION, "expected an object with request/response lists"));
            return rules;
        }
    };

    for phase in Phase::ALL {
        let list = match sections.get(phase.as_str()) {
            None | Some(Value::Null) => continue,
            Some(Value::Array(list)) => list,
            Some(_) => {
                issues.push(ValidationIssue::new(
                    format!("{RULES_SECTION}.{phase}"),
                    "expected a list of rules",
                ));
                continue;
            }
        };

        let target = match phase {
            Phase::Request => &mut rules.request,
            Phase::Response => &mut rules.response,
        };
        for (index, raw) in list.iter().enumerate() {
            let path = format!("{RULES_SECTION}.{phase}[{index}]");
            if let Some(rule) = check_rule(raw, phase, &path, origins, issues) {
                target.push(rule);
            }
        }
    }

    rules
}

fn check_rule(
    raw: &Value,
    phase: Phase,
    path: &str,
    origins: &[Origin],
    issues: &mut Vec<ValidationIssue>,
) -> Option<Rule> {
    let Value::Object(fields) = raw else {
        issues.push(ValidationIssue::new(path, "rule must be an object"));
        return None;
    };
    let before = issues.len();

    if !matches!(fields.get("match"), Some(Value::String(_))) {
        issues.push(ValidationIssue::new(format!("{path}.match"), "must be a string"));
    }

    if !matches!(fields.get("name"), None | Some(Value::Null | Value::String(_))) {
        issues.push(ValidationIssue::new(format!("{path}.name"), "must be a string"));
    }

    let empty = Map::new();
    let behavior = match fields.get(BEHAVIOR_KEY) {
        Some(Value::Object(behavior)) => behavior,
        _ => {
            issues.push(ValidationIssue::new(format!("{path}.{BEHAVIOR_KEY}"), "must be an object"));
            &empty
        }
    };

    for (key, value) in behavior {
        match BehaviorKind::from_key(key) {
            Some(kind) if kind.valid_in(phase) => {
                if kind == BehaviorKind::SetOrigin {
                    check_origin_reference(value, &format!("{path}.{BEHAVIOR_KEY}.{key}"), origins, issues);
                }
            }
            Some(_) => tracing::warn!(rule = %path, behavior = %key, "behavior is not valid in the {phase} phase"),
            None => tracing::warn!(rule = %path, behavior = %key, "unknown behavior"),
        }
    }

    if issues.len() > before {
        return None;
    }

    Some(Rule::from_fields(fields.clone()))
}

fn check_origin_reference(
    value: &Value,
    path: &str,
    origins: &[Origin],
    issues: &mut Vec<ValidationIssue>,
) {
    let Some(name) = value.get("name").and_then(Value::as_str) else {
        issues.push(ValidationIssue::new(format!("{path}.name"), "must be a string"));
        return;
    };

    let Some(origin) = origins.iter().find(|origin| origin.name == name) else {
        issues.push(ValidationIssue::new(
            path,
            format!("origin '{name}' is not declared in the origin section"),
        ));
        return;
    };

    if let Some(kind) = value.get("type").and_then(Value::as_str) {
        if kind != origin.kind.as_str() {
            issues.push(ValidationIssue::new(
                format!("{path}.type"),
                format!("'{kind}' does not match origin '{name}' of type '{}'", origin.kind),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(value: Value) -> KilnConfig {
        KilnConfig::from_value(value).unwrap()
    }

    #[test]
    fn empty_config_compiles_to_empty_manifest() {
        let manifest = compile(&KilnConfig::new()).unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn legacy_rule_is_migrated() {
        let manifest = compile(&config(json!({
            "origin": [{ "name": "o1", "type": "object_storage" }],
            "rules": { "request": [{ "match": "^/", "setOrigin": { "name": "o1" } }] }
        })))
        .unwrap();

        let rule = &manifest.rules.request[0];
        assert_eq!(rule.pattern(), "^/");
        assert_eq!(rule.behavior("setOrigin"), Some(&json!({ "name": "o1" })));
    }

    #[test]
    fn collects_every_issue() {
        let err = compile(&config(json!({
            "origin": [
                { "name": "a", "type": "object_storage" },
                { "name": "a", "type": "single_origin" },
                { "type": "warp_drive" }
            ],
            "rules": {
                "request": [
                    "^/",
                    { "match": 42 },
                    { "match": "^/x", "setOrigin": { "name": "missing" } },
                    { "match": "^/y", "setOrigin": { "name": "a", "type": "single_origin" } }
                ]
            }
        })))
        .unwrap_err();

        let paths: Vec<_> = err.issues().iter().map(|issue| issue.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "origin[1].name",
                "origin[2].name",
                "origin[2].type",
                "rules.request[0]",
                "rules.request[1].match",
                "rules.request[2].behavior.setOrigin",
                "rules.request[3].behavior.setOrigin.type",
            ]
        );
    }

    #[test]
    fn unknown_behaviors_are_kept() {
        let manifest = compile(&config(json!({
            "rules": { "response": [{ "match": "^/", "behavior": { "teleport": true } }] }
        })))
        .unwrap();
        assert_eq!(manifest.rules.response[0].behavior("teleport"), Some(&json!(true)));
    }

    #[test]
    fn rule_metadata_passes_through() {
        let manifest = compile(&config(json!({
            "rules": { "request": [{
                "name": "api",
                "match": "^/api",
                "description": "api calls",
                "active": false,
                "deliver": true
            }] }
        })))
        .unwrap();

        let rule = &manifest.rules.request[0];
        assert_eq!(rule.name(), Some("api"));
        assert_eq!(rule.get("active"), Some(&json!(false)));
        assert_eq!(rule.behavior("deliver"), Some(&json!(true)));
    }
}

//! Legacy rule migration.
//!
//! Older configurations put actions directly on the rule
//! (`{ "match": "^/", "setOrigin": {...} }`). The current shape nests them
//! under `behavior`. Migration moves every key that names a behavior allowed
//! in the rule's phase, keeping the rule's own key order. Anything it does
//! not understand is passed through untouched; it never fails.

use kiln_config::{KilnConfig, RULES_SECTION};
use serde_json::{Map, Value};

use crate::behavior::{BehaviorKind, Phase};

pub const BEHAVIOR_KEY: &str = "behavior";

/// Migrate every legacy rule in `config`.
pub fn migrate(config: &KilnConfig) -> KilnConfig {
    let Some(rules) = config.get(RULES_SECTION) else {
        return config.clone();
    };

    let mut migrated = config.clone();
    migrated.insert(RULES_SECTION, migrate_rules(rules));
    migrated
}

/// Migrate a raw configuration tree. Non-object values are returned as is.
pub fn migrate_value(config: &Value) -> Value {
    match config {
        Value::Object(map) => migrate(&KilnConfig::from(map.clone())).into_value(),
        other => other.clone(),
    }
}

/// Migrate a `rules` section (`{ request: [...], response: [...] }`).
pub fn migrate_rules(rules: &Value) -> Value {
    let Value::Object(sections) = rules else {
        return rules.clone();
    };

    let mut out = sections.clone();
    for phase in Phase::ALL {
        if let Some(Value::Array(list)) = sections.get(phase.as_str()) {
            let list = list.iter().map(|rule| migrate_rule(rule, phase)).collect();
            out.insert(phase.as_str().to_string(), Value::Array(list));
        }
    }
    Value::Object(out)
}

/// Migrate one rule for the given phase.
pub fn migrate_rule(rule: &Value, phase: Phase) -> Value {
    let Value::Object(fields) = rule else {
        return rule.clone();
    };

    let mut behavior = match fields.get(BEHAVIOR_KEY) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(existing)) => existing.clone(),
        Some(_) => return rule.clone(),
    };

    let mut out = Map::with_capacity(fields.len() + 1);
    for (key, value) in fields {
        if BehaviorKind::for_phase(key, phase).is_some() {
            behavior.insert(key.clone(), value.clone());
        } else {
            out.insert(key.clone(), value.clone());
        }
    }

    // an authored `behavior` keeps its position, a new one goes last
    match out.get_mut(BEHAVIOR_KEY) {
        Some(slot) => *slot = Value::Object(behavior),
        None => {
            out.insert(BEHAVIOR_KEY.to_string(), Value::Object(behavior));
        }
    }
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keys(value: &Value) -> Vec<&str> {
        value.as_object().unwrap().keys().map(String::as_str).collect()
    }

    #[test]
    fn moves_request_behaviors_into_behavior() {
        let rule = json!({ "name": "r", "match": "^/", "setOrigin": { "name": "o1" }, "deliver": true });
        let migrated = migrate_rule(&rule, Phase::Request);

        assert_eq!(keys(&migrated), vec!["name", "match", "behavior"]);
        assert_eq!(keys(&migrated["behavior"]), vec!["setOrigin", "deliver"]);
    }

    #[test]
    fn existing_behavior_entries_come_first() {
        let rule = json!({
            "match": "^/",
            "behavior": { "runFunction": { "path": "./f.js" }, "deliver": false },
            "setCookie": "a=b",
            "deliver": true
        });
        let migrated = migrate_rule(&rule, Phase::Request);

        assert_eq!(keys(&migrated), vec!["match", "behavior"]);
        assert_eq!(keys(&migrated["behavior"]), vec!["runFunction", "deliver", "setCookie"]);
        assert_eq!(migrated["behavior"]["deliver"], true);
    }

    #[test]
    fn phase_decides_what_moves() {
        let rule = json!({ "match": "^/", "enableGZIP": true, "setOrigin": { "name": "o" } });

        let response = migrate_rule(&rule, Phase::Response);
        assert_eq!(keys(&response["behavior"]), vec!["enableGZIP"]);
        assert!(response.get("setOrigin").is_some());

        let request = migrate_rule(&rule, Phase::Request);
        assert_eq!(keys(&request["behavior"]), vec!["setOrigin"]);
        assert!(request.get("enableGZIP").is_some());
    }

    #[test]
    fn malformed_rules_pass_through() {
        assert_eq!(migrate_rule(&json!("^/"), Phase::Request), json!("^/"));

        let odd = json!({ "match": "^/", "behavior": "deliver", "deliver": true });
        assert_eq!(migrate_rule(&odd, Phase::Request), odd);

        let rules = json!({ "request": "nope" });
        assert_eq!(migrate_rules(&rules), rules);
    }

    #[test]
    fn config_without_rules_is_unchanged() {
        let config = KilnConfig::from_value(json!({ "build": { "preset": "vue" } })).unwrap();
        assert_eq!(migrate(&config), config);
    }
}

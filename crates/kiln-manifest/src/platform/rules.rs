use kiln_config::{KilnConfig, RULES_SECTION};
use serde_json::{Map, Value, json};

use super::{PayloadStrategy, PlatformPayload, is_truthy};
use crate::behavior::{BehaviorKind, Phase};
use crate::error::{ManifestError, Result};
use crate::migrate::BEHAVIOR_KEY;

/// Rule 1 is the platform's default rule; user rules start after it.
const FIRST_RULE_ORDER: usize = 2;

/// Rules, with each configured behavior translated into platform behaviors.
///
/// Expects migrated rules and runs after the origin and cache strategies.
pub struct RulesStrategy;

impl PayloadStrategy for RulesStrategy {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()> {
        let Some(sections) = config.get(RULES_SECTION) else {
            return Ok(());
        };

        for phase in Phase::ALL {
            let Some(rules) = sections.get(phase.as_str()).and_then(Value::as_array) else {
                continue;
            };
            for (index, rule) in rules.iter().enumerate() {
                let platform_rule = self.rule(rule, phase, index, payload)?;
                payload.rules.push(platform_rule);
            }
        }
        Ok(())
    }
}

impl RulesStrategy {
    fn rule(&self, rule: &Value, phase: Phase, index: usize, payload: &mut PlatformPayload) -> Result<Value> {
        let variable = rule.get("variable").and_then(Value::as_str).unwrap_or("uri");
        let mut behaviors = Vec::new();

        if let Some(Value::Object(configured)) = rule.get(BEHAVIOR_KEY) {
            for (key, value) in configured {
                match BehaviorKind::for_phase(key, phase) {
                    Some(kind) => behaviors.extend(self.transform(kind, phase, value, payload)?),
                    None => tracing::warn!(behavior = %key, %phase, "unknown behavior, skipped"),
                }
            }
        }

        Ok(json!({
            "name": rule.get("name").cloned().unwrap_or(Value::Null),
            "phase": phase.as_str(),
            "description": rule.get("description").cloned().unwrap_or_else(|| json!("")),
            "is_active": rule.get("active").cloned().unwrap_or(json!(true)),
            "order": index + FIRST_RULE_ORDER,
            "criteria": [[{
                "variable": format!("${{{variable}}}"),
                "operator": "matches",
                "conditional": "if",
                "input_value": rule.get("match").cloned().unwrap_or(Value::Null),
            }]],
            "behaviors": behaviors,
        }))
    }

    fn transform(
        &self,
        kind: BehaviorKind,
        phase: Phase,
        value: &Value,
        payload: &mut PlatformPayload,
    ) -> Result<Vec<Value>> {
        use BehaviorKind::*;

        let behavior = |name: &str, target: Value| vec![json!({ "name": name, "target": target })];
        let toggle = |name: &str, target: Value| {
            if is_truthy(value) { behavior(name, target) } else { Vec::new() }
        };

        let out = match (kind, phase) {
            (SetOrigin, _) => behavior("set_origin", self.origin_target(value, payload)?),
            (Rewrite, _) => behavior("rewrite_request", value.clone()),
            (Deliver, Phase::Request) => behavior("deliver", Value::Null),
            (SetCookie, Phase::Request) => behavior("add_request_cookie", value.clone()),
            (SetCookie, Phase::Response) => behavior("set_cookie", value.clone()),
            (SetHeaders, _) => {
                let name = match phase {
                    Phase::Request => "add_request_header",
                    Phase::Response => "add_response_header",
                };
                let headers = value.as_array().ok_or_else(|| {
                    ManifestError::platform(self.name(), "setHeaders must be a list of headers")
                })?;
                headers
                    .iter()
                    .map(|header| json!({ "name": name, "target": header }))
                    .collect()
            }
            (SetCache, _) => match value {
                Value::String(_) => behavior("set_cache_policy", value.clone()),
                Value::Object(setting) => {
                    let name = setting.get("name").cloned().unwrap_or(Value::Null);
                    let mut cache = Map::new();
                    cache.insert("name".into(), name.clone());
                    cache.extend(setting.iter().map(|(k, v)| (k.clone(), v.clone())));
                    payload.cache.push(Value::Object(cache));
                    behavior("set_cache_policy", name)
                }
                _ => Vec::new(),
            },
            (ForwardCookies, _) => toggle("forward_cookies", Value::Null),
            (RunFunction, _) => behavior("run_function", value.get("path").cloned().unwrap_or(Value::Null)),
            (EnableGzip, _) => toggle("enable_gzip", json!("")),
            (BypassCache, _) => toggle("bypass_cache_phase", Value::Null),
            (HttpToHttps, _) => toggle("redirect_http_to_https", Value::Null),
            (RedirectTo301, _) => behavior("redirect_to_301", value.clone()),
            (RedirectTo302, _) => behavior("redirect_to_302", value.clone()),
            (Capture, _) => {
                let subject = value.get("subject").and_then(Value::as_str).unwrap_or("uri");
                behavior(
                    "capture_match_groups",
                    json!({
                        "regex": value.get("match").cloned().unwrap_or(Value::Null),
                        "captured_array": value.get("captured").cloned().unwrap_or(Value::Null),
                        "subject": format!("${{{subject}}}"),
                    }),
                )
            }
            (FilterCookie, _) => behavior("filter_response_cookie", value.clone()),
            (FilterHeader, _) => behavior("filter_response_header", value.clone()),
            (Deliver, Phase::Response) => {
                tracing::warn!(behavior = %kind, %phase, "behavior has no platform equivalent, skipped");
                Vec::new()
            }
        };
        Ok(out)
    }

    /// `setOrigin` must name a declared origin of the same type.
    fn origin_target(&self, value: &Value, payload: &PlatformPayload) -> Result<Value> {
        let name = value.get("name").and_then(Value::as_str).unwrap_or_default();
        let kind = value.get("type").and_then(Value::as_str);

        let by_name = payload
            .origin
            .iter()
            .find(|origin| origin.get("name").and_then(Value::as_str) == Some(name));
        let Some(origin) = by_name else {
            return Err(ManifestError::platform(
                self.name(),
                format!("rule setOrigin name '{name}' not found in the origin settings"),
            ));
        };

        let origin_type = origin.get("origin_type").and_then(Value::as_str);
        if kind.is_some() && kind != origin_type {
            return Err(ManifestError::platform(
                self.name(),
                format!(
                    "rule setOrigin type '{}' does not match the origin settings",
                    kind.unwrap_or_default()
                ),
            ));
        }
        Ok(json!(name))
    }
}

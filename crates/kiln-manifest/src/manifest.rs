//! The routing manifest consumed by the edge network.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::behavior::Phase;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub origin: Vec<Origin>,
    #[serde(default)]
    pub rules: RuleSet,
}

impl Manifest {
    pub fn find_origin(&self, name: &str) -> Option<&Origin> {
        self.origin.iter().find(|origin| origin.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default)]
    pub request: Vec<Rule>,
    #[serde(default)]
    pub response: Vec<Rule>,
}

impl RuleSet {
    pub fn phase(&self, phase: Phase) -> &[Rule] {
        match phase {
            Phase::Request => &self.request,
            Phase::Response => &self.response,
        }
    }

    pub fn len(&self) -> usize {
        self.request.len() + self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A routing rule, kept as the ordered object migration produced.
///
/// Key order, `null` values and metadata (`description`, `active`,
/// `variable`, ...) survive compilation untouched. A compiled rule always has
/// a string `match` and an object `behavior`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rule {
    fields: Map<String, Value>,
}

impl Rule {
    pub fn new(pattern: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("match".to_string(), Value::String(pattern.into()));
        fields.insert("behavior".to_string(), Value::Object(Map::new()));
        Self { fields }
    }

    pub(crate) fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn with_behavior(mut self, key: &str, value: Value) -> Self {
        if let Some(Value::Object(behavior)) = self.fields.get_mut("behavior") {
            behavior.insert(key.to_string(), value);
        }
        self
    }

    pub fn pattern(&self) -> &str {
        self.fields.get("match").and_then(Value::as_str).unwrap_or_default()
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    pub fn behavior(&self, key: &str) -> Option<&Value> {
        self.fields.get("behavior")?.get(key)
    }

    /// Any other field, e.g. `description`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginType {
    ObjectStorage,
    SingleOrigin,
    LoadBalancer,
    LiveIngest,
}

impl OriginType {
    pub const ALL: [OriginType; 4] = [
        OriginType::ObjectStorage,
        OriginType::SingleOrigin,
        OriginType::LoadBalancer,
        OriginType::LiveIngest,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OriginType::ObjectStorage => "object_storage",
            OriginType::SingleOrigin => "single_origin",
            OriginType::LoadBalancer => "load_balancer",
            OriginType::LiveIngest => "live_ingest",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value)
    }
}

impl fmt::Display for OriginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where matched requests are fetched from. Extra fields (bucket, prefix,
/// addresses, hostHeader, ...) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Origin {
    pub name: String,

    #[serde(rename = "type")]
    pub kind: OriginType,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rule_keeps_field_order() {
        let raw = json!({
            "description": "landing page",
            "match": "^/$",
            "name": null,
            "behavior": { "deliver": true }
        });
        let rule: Rule = serde_json::from_value(raw.clone()).unwrap();

        assert_eq!(rule.pattern(), "^/$");
        assert_eq!(rule.name(), None);
        assert_eq!(rule.get("description").unwrap(), "landing page");
        assert_eq!(rule.behavior("deliver"), Some(&json!(true)));
        assert_eq!(
            serde_json::to_string(&rule).unwrap(),
            serde_json::to_string(&raw).unwrap()
        );
    }

    #[test]
    fn new_rule_has_empty_behavior() {
        let rule = Rule::new("^/api").with_behavior("deliver", json!(true));
        assert_eq!(
            serde_json::to_value(&rule).unwrap(),
            json!({ "match": "^/api", "behavior": { "deliver": true } })
        );
    }

    #[test]
    fn origin_type_uses_snake_case() {
        let origin: Origin = serde_json::from_value(json!({
            "name": "storage",
            "type": "object_storage",
            "bucket": "b"
        }))
        .unwrap();
        assert_eq!(origin.kind, OriginType::ObjectStorage);
        assert_eq!(origin.extra["bucket"], "b");
        assert_eq!(OriginType::parse("edge"), None);
    }
}

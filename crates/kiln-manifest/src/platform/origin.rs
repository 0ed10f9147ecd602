use kiln_config::{KilnConfig, ORIGIN_SECTION};
use serde_json::{Map, Value, json};

use super::{PayloadStrategy, PlatformPayload, section_list};
use crate::error::{ManifestError, Result};
use crate::manifest::OriginType;

/// Origins. Only object storage and single-origin hosts are supported by
/// the platform API.
pub struct OriginStrategy;

impl PayloadStrategy for OriginStrategy {
    fn name(&self) -> &'static str {
        "origin"
    }

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()> {
        for origin in section_list(config, ORIGIN_SECTION) {
            let kind = origin.get("type").and_then(Value::as_str).unwrap_or_default();
            let mut setting = Map::new();
            setting.insert("name".into(), origin.get("name").cloned().unwrap_or(Value::Null));
            setting.insert("origin_type".into(), json!(kind));

            match OriginType::parse(kind) {
                Some(OriginType::ObjectStorage) => {
                    setting.insert("bucket".into(), field(origin, "bucket"));
                    setting.insert("prefix".into(), field(origin, "prefix"));
                }
                Some(OriginType::SingleOrigin) => {
                    let addresses = origin
                        .get("addresses")
                        .and_then(Value::as_array)
                        .map(|list| list.iter().map(|address| json!({ "address": address })).collect::<Vec<_>>())
                        .map(Value::Array)
                        .unwrap_or(Value::Null);
                    setting.insert("addresses".into(), addresses);
                    setting.insert("host_header".into(), field(origin, "hostHeader"));
                }
                _ => {
                    return Err(ManifestError::platform(
                        self.name(),
                        format!("origin type '{kind}' is not supported"),
                    ));
                }
            }

            payload.origin.push(Value::Object(setting));
        }
        Ok(())
    }
}

fn field(origin: &Value, key: &str) -> Value {
    origin.get(key).cloned().unwrap_or(Value::Null)
}

use kiln_config::KilnConfig;
use serde_json::{Map, Value, json};

use super::{PayloadStrategy, PlatformPayload, is_truthy, section_list};
use crate::error::{ManifestError, Result};

pub const PURGE_SECTION: &str = "purge";

const DEFAULT_METHOD: &str = "delete";
const DEFAULT_CACHEKEY_LAYER: &str = "edge_caching";

pub struct PurgeStrategy;

impl PayloadStrategy for PurgeStrategy {
    fn name(&self) -> &'static str {
        "purge"
    }

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()> {
        for purge in section_list(config, PURGE_SECTION) {
            let kind = purge.get("type").and_then(Value::as_str);
            let urls = purge.get("urls").and_then(Value::as_array).cloned().unwrap_or_default();

            for url in &urls {
                let url = url.as_str().unwrap_or_default();
                if !url.contains("http://") && !url.contains("https://") {
                    return Err(ManifestError::platform(
                        self.name(),
                        format!("the URL '{url}' must contain the protocol (http:// or https://)"),
                    ));
                }
                if kind == Some("wildcard") && !url.contains('*') {
                    return Err(ManifestError::platform(
                        self.name(),
                        format!("the wildcard URL '{url}' must contain the wildcard character (*)"),
                    ));
                }
            }

            let mut setting = Map::new();
            setting.insert("type".into(), purge.get("type").cloned().unwrap_or(Value::Null));
            setting.insert("urls".into(), Value::Array(urls));
            setting.insert("method".into(), or_default(purge, "method", DEFAULT_METHOD));
            if kind == Some("cachekey") {
                setting.insert("layer".into(), or_default(purge, "layer", DEFAULT_CACHEKEY_LAYER));
            }

            payload.purge.push(Value::Object(setting));
        }
        Ok(())
    }
}

fn or_default(node: &Value, key: &str, default: &str) -> Value {
    node.get(key)
        .filter(|v| is_truthy(v))
        .cloned()
        .unwrap_or_else(|| json!(default))
}

use kiln_config::KilnConfig;
use serde_json::{Map, Value, json};

use super::expr::evaluate_ttl;
use super::{PayloadStrategy, PlatformPayload, is_truthy, section_list};
use crate::error::{ManifestError, Result};

pub const CACHE_SECTION: &str = "cache";

const DEFAULT_BROWSER_TTL: i64 = 0;
const DEFAULT_EDGE_TTL: i64 = 60;

/// Cache settings with TTL expressions evaluated.
pub struct CacheStrategy;

impl PayloadStrategy for CacheStrategy {
    fn name(&self) -> &'static str {
        "cache"
    }

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()> {
        for cache in section_list(config, CACHE_SECTION) {
            let browser = cache.get("browser").filter(|v| is_truthy(v));
            let edge = cache.get("edge").filter(|v| is_truthy(v));

            let mut setting = Map::new();
            setting.insert("name".into(), cache.get("name").cloned().unwrap_or(Value::Null));
            setting.insert("browser_cache_settings".into(), json!(mode(browser)));
            setting.insert(
                "browser_cache_settings_maximum_ttl".into(),
                self.ttl(browser, DEFAULT_BROWSER_TTL)?,
            );
            setting.insert("cdn_cache_settings".into(), json!(mode(edge)));
            setting.insert("cdn_cache_settings_maximum_ttl".into(), self.ttl(edge, DEFAULT_EDGE_TTL)?);
            setting.insert("enable_caching_for_post".into(), json!(flag(cache, &["methods", "post"])));
            setting.insert("enable_caching_for_options".into(), json!(flag(cache, &["methods", "options"])));
            setting.insert("enable_query_string_sort".into(), json!(flag(cache, &["queryStringSort"])));

            if let Some(by_query) = cache.get("cacheByQueryString").filter(|v| is_truthy(v)) {
                let (option, list) = cache_by(by_query);
                setting.insert("cache_by_query_string".into(), option);
                setting.insert("query_string_fields".into(), list);
            }
            if let Some(by_cookie) = cache.get("cacheByCookie").filter(|v| is_truthy(v)) {
                let (option, list) = cache_by(by_cookie);
                setting.insert("cache_by_cookie".into(), option);
                setting.insert("cookie_names".into(), list);
            }

            payload.cache.push(Value::Object(setting));
        }
        Ok(())
    }
}

impl CacheStrategy {
    fn ttl(&self, layer: Option<&Value>, default: i64) -> Result<Value> {
        match layer {
            None => Ok(json!(default)),
            Some(layer) => {
                let max_age = layer.get("maxAgeSeconds").unwrap_or(&Value::Null);
                evaluate_ttl(max_age).map_err(|message| ManifestError::platform(self.name(), message))
            }
        }
    }
}

fn mode(layer: Option<&Value>) -> &'static str {
    if layer.is_some() { "override" } else { "honor" }
}

fn flag(cache: &Value, path: &[&str]) -> bool {
    path.iter()
        .try_fold(cache, |node, key| node.get(key))
        .is_some_and(is_truthy)
}

/// `varies` means "all"; only allow/deny lists carry field names.
fn cache_by(setting: &Value) -> (Value, Value) {
    let option = setting.get("option").cloned().unwrap_or(Value::Null);
    let fields = match option.as_str() {
        Some("whitelist" | "blacklist") => setting
            .get("list")
            .filter(|list| is_truthy(list))
            .cloned()
            .unwrap_or_else(|| json!([])),
        _ => json!([]),
    };
    let option = match option.as_str() {
        Some("varies") => json!("all"),
        _ => option,
    };
    (option, fields)
}

//! High-level configuration tree for kiln.
//!
//! A `KilnConfig` is an ordered JSON object. Only the `build` section has a
//! typed view ([`BuildOptions`]); `origin`, `rules`, `cache` and any other
//! section stay as raw trees so the manifest compiler sees them exactly as
//! authored.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::build::BuildOptions;
use crate::error::{ConfigError, Result as ConfigResult};
use crate::merge::merge_values;

pub const BUILD_SECTION: &str = "build";
pub const ORIGIN_SECTION: &str = "origin";
pub const RULES_SECTION: &str = "rules";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KilnConfig(Map<String, Value>);

impl KilnConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from serde_json::Value (for presets and programmatic config)
    ///
    /// # Example
    ///
    /// ```
    /// use kiln_config::KilnConfig;
    /// use serde_json::json;
    ///
    /// let config = KilnConfig::from_value(json!({
    ///     "build": { "entry": "src/index.ts", "preset": "typescript" }
    /// }))
    /// .unwrap();
    /// assert_eq!(config.preset_name(), Some("typescript"));
    /// ```
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            other => Err(ConfigError::InvalidValue {
                field: "config".to_string(),
                hint: Some(format!("expected an object, found {}", type_name(&other))),
            }),
        }
    }

    /// Convert to serde_json::Value
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, section: &str) -> Option<&Value> {
        self.0.get(section)
    }

    pub fn get_mut(&mut self, section: &str) -> Option<&mut Value> {
        self.0.get_mut(section)
    }

    /// Insert or replace a top-level section, returning the previous value.
    pub fn insert(&mut self, section: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(section.into(), value)
    }

    /// Typed view of the `build` section. A missing section yields defaults.
    pub fn build(&self) -> ConfigResult<BuildOptions> {
        match self.0.get(BUILD_SECTION) {
            None | Some(Value::Null) => Ok(BuildOptions::default()),
            Some(value) => {
                serde_json::from_value(value.clone()).map_err(|e| ConfigError::InvalidValue {
                    field: BUILD_SECTION.to_string(),
                    hint: Some(e.to_string()),
                })
            }
        }
    }

    /// Write typed build options back into the tree.
    ///
    /// Keys unknown to [`BuildOptions`] are left where they are.
    pub fn set_build(&mut self, build: &BuildOptions) -> ConfigResult<()> {
        let update = serde_json::to_value(build).map_err(|e| ConfigError::InvalidValue {
            field: BUILD_SECTION.to_string(),
            hint: Some(e.to_string()),
        })?;
        let slot = self
            .0
            .entry(BUILD_SECTION.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        merge_values(slot, &update);
        Ok(())
    }

    /// The preset named by `build.preset`, if it is a string.
    pub fn preset_name(&self) -> Option<&str> {
        self.0
            .get(BUILD_SECTION)
            .and_then(|build| build.get("preset"))
            .and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for KilnConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for KilnConfig {
    type Error = ConfigError;

    fn try_from(value: Value) -> ConfigResult<Self> {
        Self::from_value(value)
    }
}

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

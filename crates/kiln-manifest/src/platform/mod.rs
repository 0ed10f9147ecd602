//! Edge platform API payload generation.
//!
//! A [`PlatformGenerator`] runs an ordered list of [`PayloadStrategy`]
//! implementations over a (migrated) configuration. Each strategy fills its
//! own slot of the shared [`PlatformPayload`]; later strategies can read what
//! earlier ones produced (rules look up origins, `setCache` adds cache
//! settings).

mod cache;
mod domain;
pub mod expr;
mod origin;
mod purge;
mod rules;

use std::path::Path;

use kiln_config::KilnConfig;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::migrate::migrate;

pub use cache::CacheStrategy;
pub use domain::DomainStrategy;
pub use origin::OriginStrategy;
pub use purge::PurgeStrategy;
pub use rules::RulesStrategy;

/// The payload sent to the platform API.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlatformPayload {
    pub origin: Vec<Value>,
    pub cache: Vec<Value>,
    pub rules: Vec<Value>,
    pub domain: Map<String, Value>,
    pub purge: Vec<Value>,
}

/// One section of the payload.
pub trait PayloadStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn generate(&self, config: &KilnConfig, payload: &mut PlatformPayload) -> Result<()>;
}

pub struct PlatformGenerator {
    strategies: Vec<Box<dyn PayloadStrategy>>,
}

impl PlatformGenerator {
    /// A generator with no strategies.
    pub fn empty() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    /// Append a strategy. Strategies run in insertion order.
    pub fn with_strategy(mut self, strategy: impl PayloadStrategy + 'static) -> Self {
        self.strategies.push(Box::new(strategy));
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|strategy| strategy.name()).collect()
    }

    pub fn generate(&self, config: &KilnConfig) -> Result<PlatformPayload> {
        let migrated = migrate(config);
        let mut payload = PlatformPayload::default();
        for strategy in &self.strategies {
            tracing::debug!(strategy = strategy.name(), "generating payload section");
            strategy.generate(&migrated, &mut payload)?;
        }
        Ok(payload)
    }
}

impl Default for PlatformGenerator {
    fn default() -> Self {
        Self::empty()
            .with_strategy(OriginStrategy)
            .with_strategy(CacheStrategy)
            .with_strategy(RulesStrategy)
            .with_strategy(DomainStrategy)
            .with_strategy(PurgeStrategy)
    }
}

/// Generate the payload with the default strategy order.
pub fn generate_payload(config: &KilnConfig) -> Result<PlatformPayload> {
    PlatformGenerator::default().generate(config)
}

pub fn write_payload(payload: &PlatformPayload, path: &Path) -> Result<()> {
    crate::writer::write_json(payload, path)?;
    tracing::info!(path = %path.display(), "platform payload written");
    Ok(())
}

/// JavaScript-style truthiness, used by boolean toggles in the config.
pub(crate) fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// `config[section]` as a list; anything else is treated as empty.
pub(crate) fn section_list<'a>(config: &'a KilnConfig, section: &str) -> &'a [Value] {
    config
        .get(section)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_order() {
        assert_eq!(
            PlatformGenerator::default().strategy_names(),
            vec!["origin", "cache", "rules", "domain", "purge"]
        );
    }

    #[test]
    fn empty_config_yields_empty_payload() {
        let payload = generate_payload(&KilnConfig::new()).unwrap();
        assert_eq!(payload, PlatformPayload::default());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "origin": [], "cache": [], "rules": [], "domain": {}, "purge": [] })
        );
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!({})));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&Value::Null));
    }
}

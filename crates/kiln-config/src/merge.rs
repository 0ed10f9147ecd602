//! Configuration merge logic
//!
//! Two flavours:
//! - [`merge`]: plain deep merge. Objects merge by key, arrays are atomic,
//!   scalars and type conflicts resolve to the override.
//! - [`merge_with_user_overrides`]: preset defaults vs user config. Sections
//!   without a nested `build` object are replaced wholesale by the user's
//!   value; `build` itself merges key by key so build-critical settings the
//!   user did not mention survive.

use serde_json::{Map, Value};

use crate::config::{BUILD_SECTION, KilnConfig};

/// Deep merge `update` into `target` in place.
///
/// Existing keys keep their position; new keys are appended.
pub fn merge_values(target: &mut Value, update: &Value) {
    match (target, update) {
        (Value::Object(target_map), Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_values(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (target_slot, Value::Object(update_map)) => {
            let mut new_obj = Map::with_capacity(update_map.len());
            for (key, value) in update_map {
                new_obj.insert(key.clone(), value.clone());
            }
            *target_slot = Value::Object(new_obj);
        }
        (target_slot, Value::Array(_)) => {
            *target_slot = update.clone();
        }
        (target_slot, _) => {
            *target_slot = update.clone();
        }
    }
}

/// Deep merge two owned values, `overlay` taking precedence.
pub fn deep_merge(mut base: Value, overlay: Value) -> Value {
    merge_values(&mut base, &overlay);
    base
}

/// Deep merge `overrides` over `base`. `merge(base, None) == base`.
pub fn merge(base: &KilnConfig, overrides: Option<&KilnConfig>) -> KilnConfig {
    let Some(overrides) = overrides else {
        return base.clone();
    };

    let mut merged = base.as_map().clone();
    for (key, value) in overrides.as_map() {
        merge_values(merged.entry(key.clone()).or_insert(Value::Null), value);
    }
    KilnConfig::from(merged)
}

/// Merge a preset's base configuration with the user's configuration.
///
/// User values win. A node whose base value carries no nested `build`
/// object is replaced at that node; the `build` section merges normally.
pub fn merge_with_user_overrides(base: &KilnConfig, user: Option<&KilnConfig>) -> KilnConfig {
    let Some(user) = user else {
        return base.clone();
    };

    let mut merged = base.as_map().clone();
    merge_user_node(&mut merged, user.as_map());
    KilnConfig::from(merged)
}

fn merge_user_node(target: &mut Map<String, Value>, user: &Map<String, Value>) {
    for (key, user_value) in user {
        match target.get_mut(key) {
            Some(Value::Object(existing)) if user_value.is_object() && carries_build(existing) => {
                if let Value::Object(user_map) = user_value {
                    merge_user_node(existing, user_map);
                }
            }
            Some(existing) if key == BUILD_SECTION && existing.is_object() => {
                merge_values(existing, user_value);
            }
            Some(existing) => {
                *existing = user_value.clone();
            }
            None => {
                target.insert(key.clone(), user_value.clone());
            }
        }
    }
}

fn carries_build(node: &Map<String, Value>) -> bool {
    node.get(BUILD_SECTION).is_some_and(Value::is_object)
}

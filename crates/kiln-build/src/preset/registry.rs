use std::sync::Arc;

use indexmap::IndexMap;

use super::{Preset, builtin};
use crate::error::{BuildError, Result};

/// Which preset a build should use.
#[derive(Debug, Clone)]
pub enum PresetInput {
    /// A registered preset, looked up case-insensitively
    Name(String),
    /// A caller-supplied preset; its name must still be registered
    Custom(Preset),
}

impl From<&str> for PresetInput {
    fn from(name: &str) -> Self {
        PresetInput::Name(name.to_string())
    }
}

impl From<String> for PresetInput {
    fn from(name: String) -> Self {
        PresetInput::Name(name)
    }
}

impl From<Preset> for PresetInput {
    fn from(preset: Preset) -> Self {
        PresetInput::Custom(preset)
    }
}

/// Ordered map of the presets available to a build, keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct PresetRegistry {
    presets: IndexMap<String, Arc<Preset>>,
}

impl PresetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every preset kiln ships with.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for preset in builtin::all() {
            registry.register(preset);
        }
        registry
    }

    /// Add or replace a preset, returning the one it replaced.
    pub fn register(&mut self, preset: Preset) -> Option<Arc<Preset>> {
        let key = preset.name().to_lowercase();
        self.presets.insert(key, Arc::new(preset))
    }

    pub fn get(&self, name: &str) -> Option<Arc<Preset>> {
        self.presets.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.presets.contains_key(&name.to_lowercase())
    }

    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Preset>> {
        self.presets.values()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    fn unknown(&self, name: &str) -> BuildError {
        BuildError::UnknownPreset {
            name: name.to_string(),
            available: self.names().into_iter().map(str::to_string).collect(),
        }
    }
}

/// Turns a [`PresetInput`] into a preset from a registry.
pub struct PresetResolver<'a> {
    registry: &'a PresetRegistry,
}

impl<'a> PresetResolver<'a> {
    pub fn new(registry: &'a PresetRegistry) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, input: PresetInput) -> Result<Arc<Preset>> {
        match input {
            PresetInput::Name(name) => {
                let preset = self.registry.get(&name).ok_or_else(|| self.registry.unknown(&name))?;
                tracing::debug!(preset = %preset.name(), "resolved preset");
                Ok(preset)
            }
            PresetInput::Custom(preset) => {
                let name = preset.name().trim().to_string();
                if name.is_empty() {
                    return Err(BuildError::InvalidPreset {
                        name,
                        reason: "metadata name is empty".to_string(),
                    });
                }
                if preset.handler.is_none() && preset.default_entry().is_none() {
                    return Err(BuildError::InvalidPreset {
                        name,
                        reason: "a preset needs a handler or a default build.entry".to_string(),
                    });
                }
                if !self.registry.contains(&name) {
                    return Err(self.registry.unknown(&name));
                }
                tracing::debug!(preset = %name, "using custom preset");
                Ok(Arc::new(preset))
            }
        }
    }
}

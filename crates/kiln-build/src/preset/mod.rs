//! Presets: a default configuration plus optional handler and build hooks.
//!
//! Built-in presets live in [`builtin`]; a [`PresetRegistry`] owns the set
//! available to a build and [`PresetResolver`] turns a [`PresetInput`] into a
//! concrete preset.

pub mod builtin;
mod hooks;
mod registry;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use kiln_config::{BUILD_SECTION, EntryPoints, KilnConfig};
use serde::Serialize;

pub use hooks::{PostbuildHook, PrebuildHook, StaticSitePrebuild};
pub use registry::{PresetInput, PresetRegistry, PresetResolver};

/// What kind of worker a preset produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    /// User code runs on every request
    Compute,
    /// Static files served from storage
    Deliver,
}

impl PresetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresetKind::Compute => "compute",
            PresetKind::Deliver => "deliver",
        }
    }
}

impl fmt::Display for PresetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetMetadata {
    pub name: String,
    pub kind: PresetKind,
    /// Source extension of the generated entry, "js" or "ts"
    pub ext: String,
}

/// Worker source shipped with a preset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handler {
    File(PathBuf),
    Inline(String),
}

#[derive(Clone)]
pub struct Preset {
    pub metadata: PresetMetadata,
    pub config: KilnConfig,
    pub handler: Option<Handler>,
    pub prebuild: Option<Arc<dyn PrebuildHook>>,
    pub postbuild: Option<Arc<dyn PostbuildHook>>,
}

impl Preset {
    pub fn new(name: impl Into<String>, kind: PresetKind) -> Self {
        Self {
            metadata: PresetMetadata {
                name: name.into(),
                kind,
                ext: "js".to_string(),
            },
            config: KilnConfig::new(),
            handler: None,
            prebuild: None,
            postbuild: None,
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.metadata.ext = ext.into();
        self
    }

    pub fn with_config(mut self, config: KilnConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_handler(mut self, handler: Handler) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn with_prebuild(mut self, hook: impl PrebuildHook + 'static) -> Self {
        self.prebuild = Some(Arc::new(hook));
        self
    }

    pub fn with_postbuild(mut self, hook: impl PostbuildHook + 'static) -> Self {
        self.postbuild = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// First `build.entry` of the preset's own configuration.
    pub fn default_entry(&self) -> Option<String> {
        let entry = self.config.get(BUILD_SECTION)?.get("entry")?.clone();
        let entry: EntryPoints = serde_json::from_value(entry).ok()?;
        entry.first().map(str::to_string)
    }
}

impl fmt::Debug for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preset")
            .field("metadata", &self.metadata)
            .field("config", &self.config)
            .field("handler", &self.handler)
            .field("prebuild", &self.prebuild.is_some())
            .field("postbuild", &self.postbuild.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_entry_reads_first_configured_entry() {
        let preset = Preset::new("custom", PresetKind::Compute).with_config(
            KilnConfig::from_value(json!({ "build": { "entry": ["src/a.js", "src/b.js"] } })).unwrap(),
        );
        assert_eq!(preset.default_entry().as_deref(), Some("src/a.js"));
        assert_eq!(Preset::new("bare", PresetKind::Compute).default_entry(), None);
    }

    #[test]
    fn debug_hides_hook_objects() {
        let preset = Preset::new("html", PresetKind::Deliver);
        let rendered = format!("{preset:?}");
        assert!(rendered.contains("prebuild: false"));
    }
}

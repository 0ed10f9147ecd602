//! File-based config discovery for CLI use
//!
//! Handles finding, loading and bootstrapping kiln configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::KilnConfig;
use crate::error::{ConfigError, Result};

pub const JSON_CONFIG_FILENAME: &str = "kiln.config.json";
pub const TOML_CONFIG_FILENAME: &str = "kiln.config.toml";
pub const PACKAGE_JSON_FIELD: &str = "kiln";
const PACKAGE_JSON: &str = "package.json";

/// How a configuration file is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Toml,
    /// The `kiln` field of `package.json`
    PackageJson,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        if path.file_name().is_some_and(|name| name == PACKAGE_JSON) {
            return Ok(Self::PackageJson);
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Self::Json),
            Some("toml") => Ok(Self::Toml),
            other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("<none>").to_string())),
        }
    }

    /// Parse `content` into the JSON tree; TOML keeps its key order.
    fn parse(self, content: &str, path: &Path) -> Result<Value> {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let invalid = |hint: String| ConfigError::InvalidValue {
            field: file.clone(),
            hint: Some(hint),
        };

        match self {
            Self::Json => serde_json::from_str(content).map_err(|e| invalid(format!("Invalid JSON: {e}"))),
            Self::Toml => {
                let table: toml::Table =
                    toml::from_str(content).map_err(|e| invalid(format!("Invalid TOML: {e}")))?;
                serde_json::to_value(table).map_err(|e| invalid(format!("Cannot represent TOML as JSON: {e}")))
            }
            Self::PackageJson => {
                let mut manifest: Value =
                    serde_json::from_str(content).map_err(|e| invalid(format!("Invalid JSON: {e}")))?;
                match manifest.get_mut(PACKAGE_JSON_FIELD).map(Value::take) {
                    Some(Value::Null) | None => Err(ConfigError::InvalidValue {
                        field: PACKAGE_JSON_FIELD.to_string(),
                        hint: Some(format!("Add a non-null '{PACKAGE_JSON_FIELD}' object to package.json")),
                    }),
                    Some(value) => Ok(value),
                }
            }
        }
    }
}

/// File-based configuration discovery
///
/// Searches for kiln configuration files in conventional locations and loads them.
/// Library users can build a `KilnConfig` with `KilnConfig::from_value()` instead.
///
/// # Example
///
/// ```no_run
/// use kiln_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let config = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a new config discovery with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Find a config file in the root directory
    ///
    /// Searches in this order:
    /// 1. kiln.config.json
    /// 2. kiln.config.toml
    /// 3. package.json (kiln field)
    pub fn find(&self) -> Option<PathBuf> {
        for name in [JSON_CONFIG_FILENAME, TOML_CONFIG_FILENAME] {
            let path = self.root.join(name);
            if path.exists() {
                return Some(path);
            }
        }

        let pkg_path = self.root.join(PACKAGE_JSON);
        let has_field = fs::read_to_string(&pkg_path)
            .ok()
            .and_then(|content| serde_json::from_str::<Value>(&content).ok())
            .is_some_and(|parsed| parsed.get(PACKAGE_JSON_FIELD).is_some_and(|v| !v.is_null()));
        has_field.then_some(pkg_path)
    }

    /// Load config from discovered file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotFound` if no config file is found.
    pub fn load(&self) -> Result<KilnConfig> {
        let path = self.find().ok_or(ConfigError::NotFound)?;
        self.load_from(&path)
    }

    /// Load the project config if there is one.
    ///
    /// A project without a config file is not an error: the build bootstraps one.
    pub fn try_load(&self) -> Result<Option<KilnConfig>> {
        match self.find() {
            Some(path) => self.load_from(&path).map(Some),
            None => Ok(None),
        }
    }

    /// Load config from a specific file path
    pub fn load_from(&self, path: &Path) -> Result<KilnConfig> {
        let format = ConfigFormat::from_path(path)?;
        tracing::debug!(path = %path.display(), ?format, "loading configuration");

        let content = fs::read_to_string(path)?;
        let value = format.parse(&content, path)?;
        KilnConfig::from_value(value)
    }

    /// Path the bootstrap config is written to.
    /// Path the bootstrap config is written to.
    pub fn default_config_path(&self) -> PathBuf {
        self.root.join(JSON_CONFIG_FILENAME)
    }

    /// Persist `config` as the project's configuration file.
    pub fn write(&self, config: &KilnConfig) -> Result<PathBuf> {
        let path = self.default_config_path();
        write_config(&path, config)?;
        Ok(path)
    }
}

/// Write a configuration as pretty JSON, creating parent directories.
pub fn write_config(path: &Path, config: &KilnConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut content = serde_json::to_string_pretty(config)?;
    content.push('\n');
    fs::write(path, content)?;
    tracing::info!(path = %path.display(), "wrote configuration file");
    Ok(())
}

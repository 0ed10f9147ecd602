//! Pluggable validation of the `build` section
//!
//! Separates filesystem validation (for CLI use) from schema validation (for library use).

use std::path::{Path, PathBuf};

use crate::build::{BuildOptions, EntryPoints};
use crate::error::{ConfigError, Result};

const KNOWN_EXTENSIONS: &[&str] = &["js", "ts"];

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, build: &BuildOptions) -> Result<()>;
}

/// Schema-only validation (no filesystem checks)
///
/// # Example
///
/// ```
/// use kiln_config::{BuildOptions, ConfigValidator, SchemaValidator};
///
/// let mut build = BuildOptions::default();
/// build.entry = Some("main.js".into());
///
/// SchemaValidator.validate(&build).unwrap();
/// ```
pub struct SchemaValidator;

impl ConfigValidator for SchemaValidator {
    fn validate(&self, build: &BuildOptions) -> Result<()> {
        if let Some(entry) = &build.entry {
            if entry.is_empty() {
                return Err(ConfigError::MissingEntry);
            }
            if let EntryPoints::Multiple(paths) = entry {
                if paths.iter().any(|path| path.trim().is_empty()) {
                    return Err(ConfigError::SchemaValidation {
                        message: "entry paths cannot be empty".to_string(),
                        hint: Some("Remove empty strings from the 'entry' array".to_string()),
                    });
                }
            }
        }

        if let Some(ext) = &build.extension {
            if !KNOWN_EXTENSIONS.contains(&ext.as_str()) {
                return Err(ConfigError::SchemaValidation {
                    message: format!("unsupported extension '{ext}'"),
                    hint: Some("Use \"js\" or \"ts\"".to_string()),
                });
            }
        }

        if let Some(memory_fs) = &build.memory_fs {
            if memory_fs.injection_dirs.iter().any(|dir| dir.as_os_str().is_empty()) {
                return Err(ConfigError::SchemaValidation {
                    message: "memoryFS.injectionDirs cannot contain empty paths".to_string(),
                    hint: None,
                });
            }
        }

        Ok(())
    }
}

/// Filesystem validator (for CLI use)
///
/// Checks that entry files and memory-fs directories exist under `root`.
pub struct FsValidator {
    root: PathBuf,
}

impl FsValidator {
    /// Create a new filesystem validator with a root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl ConfigValidator for FsValidator {
    fn validate(&self, build: &BuildOptions) -> Result<()> {
        SchemaValidator.validate(build)?;

        if let Some(entry) = &build.entry {
            for path in entry.paths() {
                let path = self.root.join(path);
                if !path.is_file() {
                    return Err(ConfigError::EntryNotFound { path });
                }
            }
        }

        if let Some(memory_fs) = &build.memory_fs {
            for dir in &memory_fs.injection_dirs {
                let path = self.root.join(dir);
                if !path.is_dir() {
                    return Err(ConfigError::InjectionDirNotFound { path });
                }
            }
        }

        Ok(())
    }
}

/// Convenience function for schema-only validation
pub fn validate_schema(build: &BuildOptions) -> Result<()> {
    SchemaValidator.validate(build)
}

/// Convenience function for filesystem validation
pub fn validate_fs(build: &BuildOptions, root: impl AsRef<Path>) -> Result<()> {
    FsValidator::new(root).validate(build)
}

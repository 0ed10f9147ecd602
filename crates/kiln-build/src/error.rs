//! Error types for preset resolution and the build pipeline.

use std::path::PathBuf;

use kiln_config::ConfigError;
use kiln_manifest::ManifestError;
use thiserror::Error;

use crate::orchestrator::BuildPhase;

pub type Result<T, E = BuildError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unknown preset '{name}'\n\nHint: available presets are {}", available.join(", "))]
    UnknownPreset {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid preset '{name}': {reason}")]
    InvalidPreset { name: String, reason: String },

    #[error("no preset configured\n\nHint: set 'build.preset' in your configuration or pass --preset")]
    MissingPreset,

    #[error("entry point not found: {}\n\nHint: check the 'build.entry' field in your config or --entry argument", path.display())]
    EntryNotFound { path: PathBuf },

    #[error("Cannot determine entry point. Please specify one using --entry or in your configuration.")]
    NoEntry,

    #[error("invalid entry {}: {reason}", path.display())]
    InvalidEntry { path: PathBuf, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{hook} hook failed: {message}")]
    Hook { hook: &'static str, message: String },

    #[error("{bundler} failed: {message}")]
    Bundler { bundler: String, message: String },

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    pub fn hook(hook: &'static str, message: impl Into<String>) -> Self {
        Self::Hook {
            hook,
            message: message.into(),
        }
    }

    pub fn bundler(bundler: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Bundler {
            bundler: bundler.into(),
            message: message.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }
}

/// A pipeline failure, tagged with the phase that was running.
#[derive(Debug, Error)]
#[error("build failed while {}: {source}", phase.activity())]
pub struct PipelineError {
    pub phase: BuildPhase,
    pub source: BuildError,
}

impl PipelineError {
    pub fn into_source(self) -> BuildError {
        self.source
    }
}

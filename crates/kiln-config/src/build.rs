//! Typed view of the `build` section.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const DEFAULT_POLYFILLS: bool = true;
pub const DEFAULT_WORKER: bool = false;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Entry point(s) of the worker, relative to the project root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<EntryPoints>,

    /// Bundler name ("webpack" or "esbuild")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builder: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polyfills: Option<bool>,

    /// When true the entry already registers its own event listener
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,

    /// Source file extension the preset expects ("js" or "ts")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    #[serde(rename = "memoryFS", default, skip_serializing_if = "Option::is_none")]
    pub memory_fs: Option<MemoryFs>,

    /// Opaque bundler plugin configuration, handed to the bundler untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BuildOptions {
    pub fn polyfills_enabled(&self) -> bool {
        self.polyfills.unwrap_or(DEFAULT_POLYFILLS)
    }

    pub fn worker_enabled(&self) -> bool {
        self.worker.unwrap_or(DEFAULT_WORKER)
    }

    /// Replace optional flags with their effective boolean values.
    pub fn normalize_flags(&mut self) {
        self.polyfills = Some(self.polyfills_enabled());
        self.worker = Some(self.worker_enabled());
    }

    pub fn first_entry(&self) -> Option<&str> {
        self.entry.as_ref().and_then(EntryPoints::first)
    }
}

/// One entry point or several.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryPoints {
    Single(String),
    Multiple(Vec<String>),
}

impl EntryPoints {
    pub fn paths(&self) -> Vec<&str> {
        match self {
            EntryPoints::Single(path) => vec![path.as_str()],
            EntryPoints::Multiple(paths) => paths.iter().map(String::as_str).collect(),
        }
    }

    pub fn first(&self) -> Option<&str> {
        match self {
            EntryPoints::Single(path) => Some(path.as_str()),
            EntryPoints::Multiple(paths) => paths.first().map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            EntryPoints::Single(path) => path.trim().is_empty(),
            EntryPoints::Multiple(paths) => paths.is_empty(),
        }
    }
}

impl From<&str> for EntryPoints {
    fn from(path: &str) -> Self {
        EntryPoints::Single(path.to_string())
    }
}

/// Directories embedded into the worker as an in-memory filesystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryFs {
    #[serde(default)]
    pub injection_dirs: Vec<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remove_path_prefix: Option<String>,
}

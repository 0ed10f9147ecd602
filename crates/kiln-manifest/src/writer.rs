//! Manifest persistence.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::Result;
use crate::manifest::Manifest;

/// Manifest location relative to the project root.
pub const DEFAULT_MANIFEST_PATH: &str = ".edge/manifest.json";

/// Resolve the manifest path for a project, honouring an explicit override.
pub fn manifest_path(root: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => root.join(path),
        None => root.join(DEFAULT_MANIFEST_PATH),
    }
}

/// Two-space indented JSON with a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value)?;
    json.push('\n');
    Ok(json)
}

/// Write `manifest` to `path`, creating parent directories.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<()> {
    write_json(manifest, path)?;
    tracing::info!(path = %path.display(), "manifest written");
    Ok(())
}

pub(crate) fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<()> {
    let json = to_pretty_json(value)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}

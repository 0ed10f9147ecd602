//! Entry point resolution.
//!
//! Priority: explicit override, the user's `build.entry`, the preset handler,
//! then the preset's default entry.

use std::path::{Path, PathBuf};

use crate::error::{BuildError, Result};
use crate::preset::{Handler, Preset};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedEntry {
    File(PathBuf),
    Inline(String),
}

impl ResolvedEntry {
    /// Path to record in `build.entry`; inline handlers have none.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ResolvedEntry::File(path) => Some(path),
            ResolvedEntry::Inline(_) => None,
        }
    }

    pub async fn source(&self, root: &Path) -> Result<String> {
        match self {
            ResolvedEntry::File(path) => {
                let absolute = root.join(path);
                tokio::fs::read_to_string(&absolute)
                    .await
                    .map_err(|e| BuildError::read(absolute, e))
            }
            ResolvedEntry::Inline(source) => Ok(source.clone()),
        }
    }
}

/// Pick the entry for a build.
///
/// An explicit override must exist. A user entry that does not exist falls
/// through to the preset with a warning, and is reported only when nothing
/// else resolves.
pub fn resolve(
    override_entry: Option<&str>,
    user_entry: Option<&str>,
    preset: &Preset,
    root: &Path,
) -> Result<ResolvedEntry> {
    if let Some(entry) = override_entry {
        return existing_file(entry, root);
    }

    let mut missing_user_entry = None;
    if let Some(entry) = user_entry {
        match existing_file(entry, root) {
            Ok(resolved) => return Ok(resolved),
            Err(BuildError::EntryNotFound { path }) => {
                tracing::warn!(entry, "configured entry does not exist, falling back to the preset");
                missing_user_entry = Some(path);
            }
            Err(other) => return Err(other),
        }
    }

    match &preset.handler {
        Some(Handler::Inline(source)) => return Ok(ResolvedEntry::Inline(source.clone())),
        Some(Handler::File(path)) => {
            let absolute = if path.is_absolute() { path.clone() } else { root.join(path) };
            if !absolute.is_file() {
                return Err(BuildError::InvalidPreset {
                    name: preset.name().to_string(),
                    reason: format!("handler not found: {}", absolute.display()),
                });
            }
            return Ok(ResolvedEntry::File(absolute));
        }
        None => {}
    }

    if let Some(entry) = preset.default_entry() {
        return existing_file(&entry, root);
    }

    match missing_user_entry {
        Some(path) => Err(BuildError::EntryNotFound { path }),
        None => Err(BuildError::NoEntry),
    }
}

fn existing_file(entry: &str, root: &Path) -> Result<ResolvedEntry> {
    let path = PathBuf::from(entry);
    let absolute = root.join(&path);
    if !absolute.exists() {
        return Err(BuildError::EntryNotFound { path: absolute });
    }
    if !absolute.is_file() {
        return Err(BuildError::InvalidEntry {
            path: absolute,
            reason: "not a file".to_string(),
        });
    }
    Ok(ResolvedEntry::File(path))
}

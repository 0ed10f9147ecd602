//! Shared helpers for the commands.

use std::path::{Path, PathBuf};

use kiln_config::{ConfigDiscovery, KilnConfig};

use crate::error::{CliError, Result, ResultExt};

/// Resolve `path` against `cwd` unless it is absolute.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

/// The project root: `--cwd` resolved against the process directory.
pub fn project_root(cwd: Option<&Path>) -> Result<PathBuf> {
    let current = std::env::current_dir().context("Cannot read the current directory")?;
    let root = match cwd {
        Some(dir) => resolve_path(dir, &current),
        None => current,
    };
    if !root.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "project root is not a directory: {}",
            root.display()
        )));
    }
    Ok(root)
}

/// Load the configuration named by `--config`, or discover one in `root`.
///
/// `None` means the project has no configuration yet.
pub fn load_user_config(root: &Path, config: Option<&Path>) -> Result<Option<KilnConfig>> {
    let discovery = ConfigDiscovery::new(root);
    match config {
        Some(path) => {
            let path = resolve_path(path, root);
            let config = discovery.load_from(&path).with_path(&path)?;
            Ok(Some(config))
        }
        None => Ok(discovery.try_load()?),
    }
}

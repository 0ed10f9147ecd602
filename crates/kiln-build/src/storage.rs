//! Directory copies into the `.edge` tree.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{BuildError, Result};

/// Files below `dir`, in walk order, paired with their path relative to `dir`.
pub(crate) fn list_files(dir: &Path) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        files.push((entry.path().to_path_buf(), relative));
    }
    Ok(files)
}

/// Recursively copy `src` into `dest`, returning the number of files copied.
pub async fn copy_dir(src: &Path, dest: &Path) -> Result<usize> {
    let src = src.to_path_buf();
    let dest = dest.to_path_buf();

    tokio::task::spawn_blocking(move || {
        let files = list_files(&src)?;
        for (path, relative) in &files {
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(path, &target).map_err(|e| BuildError::read(path, e))?;
        }
        Ok(files.len())
    })
    .await
    .map_err(|e| BuildError::Io(std::io::Error::other(e)))?
}

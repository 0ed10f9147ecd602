//! Per-build inputs that do not come from the configuration file.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory for everything the build produces.
pub const EDGE_DIR: &str = ".edge";
/// Static assets served through the storage origin.
pub const STORAGE_DIR: &str = ".edge/storage";
/// Copies of memory-fs directories.
pub const FILES_DIR: &str = ".edge/files";

const PRODUCTION_OUTPUT: &str = ".edge/worker.js";
const DEVELOPMENT_OUTPUT: &str = ".edge/worker.dev.js";

/// Runtime event the worker is attached to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerEvent {
    #[default]
    Fetch,
    Firewall,
}

impl WorkerEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerEvent::Fetch => "fetch",
            WorkerEvent::Firewall => "firewall",
        }
    }
}

impl fmt::Display for WorkerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a build needs besides the configuration tree.
///
/// # Example
///
/// ```
/// use kiln_build::{BuildContext, WorkerEvent};
///
/// let ctx = BuildContext::new("/srv/site").production(true);
/// assert_eq!(ctx.output_path(), std::path::Path::new("/srv/site/.edge/worker.js"));
/// assert_eq!(ctx.event, WorkerEvent::Fetch);
/// ```
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub root: PathBuf,
    pub production: bool,
    /// Entry override, takes precedence over every configured entry
    pub entry: Option<String>,
    /// Bundler override, replaces `build.builder`
    pub builder: Option<String>,
    pub event: WorkerEvent,
    pub output: Option<PathBuf>,
    pub manifest_path: Option<PathBuf>,
    /// Where the bootstrap configuration is written on first run
    pub config_path: Option<PathBuf>,
}

impl BuildContext {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            production: false,
            entry: None,
            builder: None,
            event: WorkerEvent::Fetch,
            output: None,
            manifest_path: None,
            config_path: None,
        }
    }

    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn builder(mut self, builder: impl Into<String>) -> Self {
        self.builder = Some(builder.into());
        self
    }

    pub fn firewall(mut self, enabled: bool) -> Self {
        self.event = if enabled {
            WorkerEvent::Firewall
        } else {
            WorkerEvent::Fetch
        };
        self
    }

    pub fn output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = Some(path.into());
        self
    }

    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Resolve `path` against the project root unless it is absolute.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    /// Bundled worker location: `.edge/worker.js` in production, `.edge/worker.dev.js` otherwise.
    pub fn output_path(&self) -> PathBuf {
        match &self.output {
            Some(output) => self.resolve(output),
            None if self.production => self.root.join(PRODUCTION_OUTPUT),
            None => self.root.join(DEVELOPMENT_OUTPUT),
        }
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.root.join(STORAGE_DIR)
    }

    pub fn files_dir(&self) -> PathBuf {
        self.root.join(FILES_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_output_by_default() {
        let ctx = BuildContext::new("/p");
        assert_eq!(ctx.output_path(), PathBuf::from("/p/.edge/worker.dev.js"));
    }

    #[test]
    fn explicit_output_is_resolved_against_root() {
        let ctx = BuildContext::new("/p").production(true).output("dist/w.js");
        assert_eq!(ctx.output_path(), PathBuf::from("/p/dist/w.js"));
    }

    #[test]
    fn firewall_switches_event() {
        assert_eq!(BuildContext::new("/p").firewall(true).event, WorkerEvent::Firewall);
        assert_eq!(WorkerEvent::Firewall.to_string(), "firewall");
    }
}

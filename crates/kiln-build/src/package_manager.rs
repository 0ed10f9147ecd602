//! Package manager detection from lockfiles.

use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PackageManager {
    #[default]
    Npm,
    Yarn,
    Pnpm,
    Bun,
}

impl PackageManager {
    /// Pick the package manager whose lockfile is present in `root`, npm otherwise.
    pub fn detect(root: &Path) -> Self {
        let lockfiles = [
            ("yarn.lock", PackageManager::Yarn),
            ("pnpm-lock.yaml", PackageManager::Pnpm),
            ("bun.lockb", PackageManager::Bun),
            ("bun.lock", PackageManager::Bun),
            ("package-lock.json", PackageManager::Npm),
        ];
        lockfiles
            .into_iter()
            .find(|(file, _)| root.join(file).exists())
            .map(|(_, pm)| pm)
            .unwrap_or_default()
    }

    pub fn program(&self) -> &'static str {
        match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Bun => "bun",
        }
    }

    /// Arguments for `<pm> run <script> ...args`.
    ///
    /// npm needs `--` before script arguments or it treats them as its own options.
    pub fn run_script_args(&self, script: &str, args: &[String]) -> Vec<String> {
        let mut out = vec!["run".to_string(), script.to_string()];
        if !args.is_empty() {
            if *self == PackageManager::Npm {
                out.push("--".to_string());
            }
            out.extend(args.iter().cloned());
        }
        out
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

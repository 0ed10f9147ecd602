//! Prebuild results and their normalisation into bundler inputs.
//!
//! A prebuild hook may ask for files to be prepended to the entry, for
//! globals and a banner to be injected, and for bundler defines and plugins.
//! [`execute`] runs the hook (or falls back to an empty result) and folds
//! everything, including the memory filesystem, into a [`PreparedBuild`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use indexmap::IndexMap;
use kiln_config::{BuildOptions, ConfigError, KilnConfig, MemoryFs};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tokio::task::JoinSet;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::preset::Preset;
use crate::storage;

/// Global object all injected runtime data hangs off.
pub const NAMESPACE: &str = "kiln";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuildResult {
    /// Files whose contents are prepended to the entry, in this order
    #[serde(default)]
    pub files_to_inject: Vec<PathBuf>,
    #[serde(default)]
    pub injection: Injection,
    #[serde(default)]
    pub bundler: BundlerHints,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Injection {
    /// Global name to JavaScript expression
    #[serde(default)]
    pub globals: IndexMap<String, String>,
    #[serde(default)]
    pub entry: String,
    #[serde(default)]
    pub banner: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerHints {
    #[serde(default)]
    pub define_vars: IndexMap<String, String>,
    #[serde(default)]
    pub plugins: Vec<Value>,
}

/// Bundler inputs derived from a prebuild result.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedBuild {
    /// Code placed before the worker source
    pub entry_injection: String,
    pub banner: String,
    pub define_vars: IndexMap<String, String>,
    pub plugins: Vec<Value>,
    /// Memory-fs files keyed by their absolute in-worker path
    pub memory_files: BTreeMap<String, String>,
}

/// Run the preset's prebuild hook and normalise its result.
pub async fn execute(
    preset: &Preset,
    config: &KilnConfig,
    build: &BuildOptions,
    ctx: &BuildContext,
) -> Result<PreparedBuild> {
    let result = match &preset.prebuild {
        Some(hook) => {
            tracing::info!(preset = %preset.name(), "running prebuild");
            hook.prebuild(config, ctx).await?.unwrap_or_default()
        }
        None => {
            tracing::debug!(preset = %preset.name(), "no prebuild hook, using defaults");
            PrebuildResult::default()
        }
    };
    normalize(result, build.memory_fs.as_ref(), ctx).await
}

/// Fold a prebuild result and the memory filesystem into bundler inputs.
pub async fn normalize(
    result: PrebuildResult,
    memory_fs: Option<&MemoryFs>,
    ctx: &BuildContext,
) -> Result<PreparedBuild> {
    let mut entry_injection = read_ordered(&result.files_to_inject, ctx).await?.join("\n");
    if !result.injection.entry.is_empty() {
        if !entry_injection.is_empty() {
            entry_injection.push('\n');
        }
        entry_injection.push_str(&result.injection.entry);
    }

    let memory_files = match memory_fs {
        Some(memory_fs) => load_memory_fs(memory_fs, ctx).await?,
        None => BTreeMap::new(),
    };

    let banner = banner(
        memory_fs.map(|fs| fs.remove_path_prefix.as_deref().unwrap_or_default()),
        &result.injection.globals,
        &memory_files,
        &result.injection.banner,
    )?;

    Ok(PreparedBuild {
        entry_injection,
        banner,
        define_vars: result.bundler.define_vars,
        plugins: result.bundler.plugins,
        memory_files,
    })
}

/// Read every file concurrently and return the contents in input order.
async fn read_ordered(paths: &[PathBuf], ctx: &BuildContext) -> Result<Vec<String>> {
    let mut tasks = JoinSet::new();
    for (index, path) in paths.iter().enumerate() {
        let path = ctx.resolve(path);
        tasks.spawn(async move {
            let content = tokio::fs::read_to_string(&path).await;
            (index, path, content)
        });
    }

    let mut contents = vec![String::new(); paths.len()];
    while let Some(joined) = tasks.join_next().await {
        let (index, path, content) = joined.map_err(|e| BuildError::Io(std::io::Error::other(e)))?;
        contents[index] = content.map_err(|e| BuildError::read(path, e))?;
    }
    Ok(contents)
}

/// Read the injection dirs into memory and mirror them into `.edge/files`.
async fn load_memory_fs(memory_fs: &MemoryFs, ctx: &BuildContext) -> Result<BTreeMap<String, String>> {
    let mut sources = Vec::new();
    for dir in &memory_fs.injection_dirs {
        let absolute = ctx.resolve(dir);
        if !absolute.is_dir() {
            return Err(ConfigError::InjectionDirNotFound { path: absolute }.into());
        }
        for (path, relative) in storage::list_files(&absolute)? {
            sources.push((path, dir.join(relative)));
        }
        storage::copy_dir(&absolute, &ctx.files_dir().join(dir)).await?;
    }

    let mut tasks = JoinSet::new();
    for (path, key_path) in sources {
        tasks.spawn(async move {
            let bytes = tokio::fs::read(&path).await;
            (path, key_path, bytes)
        });
    }

    let mut files = BTreeMap::new();
    while let Some(joined) = tasks.join_next().await {
        let (path, key_path, bytes) = joined.map_err(|e| BuildError::Io(std::io::Error::other(e)))?;
        let bytes = bytes.map_err(|e| BuildError::read(&path, e))?;
        files.insert(memory_key(&key_path), STANDARD.encode(bytes));
    }
    tracing::debug!(files = files.len(), "loaded memory filesystem");
    Ok(files)
}

fn memory_key(path: &Path) -> String {
    let joined = path
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    format!("/{joined}")
}

/// Banner order: namespace and path prefix, globals, memory files, then the hook's own banner.
fn banner(
    path_prefix: Option<&str>,
    globals: &IndexMap<String, String>,
    files: &BTreeMap<String, String>,
    extra: &str,
) -> Result<String> {
    let mut out = String::new();

    if let Some(prefix) = path_prefix {
        let prefix = serde_json::to_string(prefix)?;
        out.push_str(&format!(
            "globalThis.{NAMESPACE} = {{}}; globalThis.{NAMESPACE}.FS_PATH_PREFIX_TO_REMOVE = {prefix};"
        ));
    } else if !globals.is_empty() {
        out.push_str(&format!("globalThis.{NAMESPACE} = globalThis.{NAMESPACE} || {{}};"));
    }

    if !globals.is_empty() {
        out.push_str(&format!("globalThis.{NAMESPACE}.globals={{}};"));
        for (name, expression) in globals {
            out.push_str(&format!("globalThis.{NAMESPACE}.globals.{name}={expression};"));
        }
    }

    if path_prefix.is_some() {
        let mut table = Map::new();
        for (key, content) in files {
            table.insert(key.clone(), json!({ "content": content }));
        }
        let table = serde_json::to_string(&Value::Object(table))?;
        out.push_str(&format!("globalThis.{NAMESPACE}.__FILES__={table};"));
    }

    if !extra.is_empty() {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(extra);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn default_result_yields_empty_inputs() {
        let dir = TempDir::new().unwrap();
        let ctx = BuildContext::new(dir.path());
        let prepared = normalize(PrebuildResult::default(), None, &ctx).await.unwrap();
        assert_eq!(prepared, PreparedBuild::default());
    }

    #[tokio::test]
    async fn injected_files_keep_declared_order() {
        let dir = TempDir::new().unwrap();
        for (name, body) in [("a.js", "const a = 1;"), ("b.js", "const b = 2;"), ("c.js", "const c = 3;")] {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let ctx = BuildContext::new(dir.path());
        let result = PrebuildResult {
            files_to_inject: vec!["c.js".into(), "a.js".into(), "b.js".into()],
            injection: Injection {
                entry: "init();".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let prepared = normalize(result, None, &ctx).await.unwrap();
        assert_eq!(prepared.entry_injection, "const c = 3;\nconst a = 1;\nconst b = 2;\ninit();");
    }

    #[tokio::test]
    async fn missing_injected_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let ctx = BuildContext::new(dir.path());
        let result = PrebuildResult {
            files_to_inject: vec!["gone.js".into()],
            ..Default::default()
        };
        let err = normalize(result, None, &ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::Read { ref path, .. } if path.ends_with("gone.js")));
    }

    #[tokio::test]
    async fn memory_fs_is_embedded_and_copied() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets/nested")).unwrap();
        fs::write(dir.path().join("assets/b.txt"), "bee").unwrap();
        fs::write(dir.path().join("assets/nested/a.txt"), "ay").unwrap();

        let ctx = BuildContext::new(dir.path());
        let memory_fs = MemoryFs {
            injection_dirs: vec!["assets".into()],
            remove_path_prefix: Some("assets/".into()),
        };
        let mut result = PrebuildResult::default();
        result.injection.globals.insert("API".into(), "'https://api'".into());

        let prepared = normalize(result, Some(&memory_fs), &ctx).await.unwrap();

        let keys: Vec<_> = prepared.memory_files.keys().cloned().collect();
        assert_eq!(keys, vec!["/assets/b.txt", "/assets/nested/a.txt"]);
        assert_eq!(prepared.memory_files["/assets/b.txt"], STANDARD.encode("bee"));

        let prefix = prepared.banner.find("FS_PATH_PREFIX_TO_REMOVE = \"assets/\"").unwrap();
        let globals = prepared.banner.find("globalThis.kiln.globals.API='https://api';").unwrap();
        let files = prepared.banner.find("globalThis.kiln.__FILES__={\"/assets/b.txt\"").unwrap();
        assert!(prefix < globals && globals < files);

        assert!(dir.path().join(".edge/files/assets/nested/a.txt").is_file());
    }

    #[tokio::test]
    async fn missing_injection_dir_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let ctx = BuildContext::new(dir.path());
        let memory_fs = MemoryFs {
            injection_dirs: vec![".next".into()],
            remove_path_prefix: None,
        };
        let err = normalize(PrebuildResult::default(), Some(&memory_fs), &ctx).await.unwrap_err();
        assert!(matches!(err, BuildError::Config(ConfigError::InjectionDirNotFound { .. })));
    }

    #[test]
    fn result_uses_camel_case_keys() {
        let result: PrebuildResult = serde_json::from_value(json!({
            "filesToInject": ["x.js"],
            "injection": { "globals": { "A": "1" } },
            "bundler": { "defineVars": { "DEBUG": "false" } }
        }))
        .unwrap();
        assert_eq!(result.files_to_inject, vec![PathBuf::from("x.js")]);
        assert_eq!(result.bundler.define_vars["DEBUG"], "false");
        assert!(result.injection.banner.is_empty());
    }
}

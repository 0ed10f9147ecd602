//! Bundler selection and invocation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use tokio::process::Command;

use crate::error::{BuildError, Result};

/// Prepended to production bundles that use polyfills, so `fs` resolves to the runtime module.
pub const NODE_FS_IMPORT: &str = "import SRC_NODE_FS from \"node:fs\";\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BundlerKind {
    #[default]
    Webpack,
    Esbuild,
}

impl BundlerKind {
    /// Read `build.builder`; unset and unrecognised names fall back to webpack.
    pub fn from_config(builder: Option<&str>) -> Self {
        match builder.map(str::to_lowercase).as_deref() {
            None => BundlerKind::Webpack,
            Some("webpack") => BundlerKind::Webpack,
            Some("esbuild") => BundlerKind::Esbuild,
            Some(other) => {
                tracing::warn!(builder = other, "unknown bundler, using webpack");
                BundlerKind::Webpack
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BundlerKind::Webpack => "webpack",
            BundlerKind::Esbuild => "esbuild",
        }
    }

    /// esbuild emits the banner itself; webpack output gets it prepended afterwards.
    pub fn supports_banner(&self) -> bool {
        matches!(self, BundlerKind::Esbuild)
    }
}

impl fmt::Display for BundlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a bundler needs for one build.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub root: PathBuf,
    /// Generated temporary entry
    pub entry: PathBuf,
    pub builder: BundlerKind,
    /// The opaque `build.custom` section
    pub plugin_config: Option<Value>,
    pub define_vars: IndexMap<String, String>,
    pub plugins: Vec<Value>,
    pub banner: String,
    pub polyfills: bool,
    pub output: PathBuf,
    pub production: bool,
}

#[async_trait]
pub trait Bundler: Send + Sync {
    fn name(&self) -> &str;

    /// Bundle `request.entry` into `request.output`.
    async fn bundle(&self, request: &BundleRequest) -> Result<()>;
}

/// Runs the bundler's CLI through `npx`.
#[derive(Debug, Clone, Copy)]
pub struct CommandBundler {
    kind: BundlerKind,
}

impl CommandBundler {
    pub fn new(kind: BundlerKind) -> Self {
        Self { kind }
    }

    /// Arguments passed to `npx`.
    ///
    /// # Errors
    ///
    /// Fails when `build.custom` or the prebuild plugins cannot be expressed
    /// for this bundler.
    pub fn args(&self, request: &BundleRequest) -> Result<Vec<String>> {
        let mut args = vec!["--yes".to_string(), self.kind.as_str().to_string()];
        match self.kind {
            BundlerKind::Esbuild => {
                if !request.plugins.is_empty() {
                    return Err(BuildError::bundler(
                        self.name(),
                        format!(
                            "the esbuild CLI cannot load the {} prebuild plugin(s)\n\nHint: set build.builder to \"webpack\"",
                            request.plugins.len()
                        ),
                    ));
                }
                args.push(request.entry.display().to_string());
                args.push("--bundle".to_string());
                args.push("--format=esm".to_string());
                args.push("--platform=browser".to_string());
                args.push(format!("--outfile={}", request.output.display()));
                if request.production {
                    args.push("--minify".to_string());
                }
                for (name, value) in &request.define_vars {
                    args.push(format!("--define:{name}={value}"));
                }
                if !request.banner.is_empty() {
                    args.push(format!("--banner:js={}", request.banner));
                }
                args.extend(esbuild_flags(request.plugin_config.as_ref())?);
            }
            BundlerKind::Webpack => {
                args.push("--config".to_string());
                args.push(webpack_config_path(request).display().to_string());
            }
        }
        Ok(args)
    }

    async fn run(&self, args: &[String], root: &Path) -> Result<()> {
        tracing::debug!(bundler = %self.kind, args = ?args, "spawning bundler");

        let output = Command::new("npx")
            .args(args)
            .current_dir(root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| BuildError::bundler(self.name(), format!("failed to run npx: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BuildError::bundler(
                self.name(),
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Bundler for CommandBundler {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    async fn bundle(&self, request: &BundleRequest) -> Result<()> {
        let args = self.args(request)?;
        if self.kind != BundlerKind::Webpack {
            return self.run(&args, &request.root).await;
        }

        let config_path = webpack_config_path(request);
        tokio::fs::write(&config_path, webpack_config(request)?).await?;
        let result = self.run(&args, &request.root).await;
        if let Err(e) = tokio::fs::remove_file(&config_path).await {
            tracing::warn!(path = %config_path.display(), error = %e, "failed to remove webpack config");
        }
        result
    }
}

/// The generated webpack config sits next to the temporary entry.
pub fn webpack_config_path(request: &BundleRequest) -> PathBuf {
    let stem = request
        .entry
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "kiln".to_string());
    request.root.join(format!("{stem}.webpack.config.cjs"))
}

/// Render the webpack config for `request`.
///
/// `build.custom` is spread into the config first; entry, output, target and
/// mode always come from the request. Defines go through `DefinePlugin`, and
/// each prebuild plugin is either a module name or
/// `{ "module": ..., "export": ..., "options": ... }`.
pub fn webpack_config(request: &BundleRequest) -> Result<String> {
    let custom = match &request.plugin_config {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(custom)) => custom.clone(),
        Some(_) => return Err(BuildError::bundler("webpack", "build.custom must be an object")),
    };
    let plugins = request
        .plugins
        .iter()
        .map(webpack_plugin)
        .collect::<Result<Vec<_>>>()?;

    let dir = request.output.parent().unwrap_or_else(|| Path::new("."));
    let file = request
        .output
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "worker.js".to_string());
    let mode = if request.production { "production" } else { "development" };

    let mut out = String::from("const webpack = require(\"webpack\");\n");
    out.push_str(&format!("const custom = {};\n\n", serde_json::to_string(&custom)?));
    out.push_str("module.exports = {\n  ...custom,\n");
    out.push_str(&format!(
        "  entry: {},\n",
        serde_json::to_string(&format!("./{}", request.entry.display()))?
    ));
    out.push_str("  target: \"webworker\",\n");
    out.push_str(&format!("  mode: \"{mode}\",\n"));
    out.push_str(&format!(
        "  output: {{ ...custom.output, path: {}, filename: {} }},\n",
        serde_json::to_string(&dir.display().to_string())?,
        serde_json::to_string(&file)?
    ));
    out.push_str("  plugins: [\n");
    out.push_str(&format!(
        "    new webpack.DefinePlugin({}),\n",
        serde_json::to_string(&request.define_vars)?
    ));
    for plugin in plugins {
        out.push_str(&format!("    {plugin},\n"));
    }
    out.push_str("  ],\n};\n");
    Ok(out)
}

fn webpack_plugin(plugin: &Value) -> Result<String> {
    let (module, export, options) = match plugin {
        Value::String(module) => (module.as_str(), None, None),
        Value::Object(fields) => {
            let Some(module) = fields.get("module").and_then(Value::as_str) else {
                return Err(BuildError::bundler("webpack", format!("plugin {plugin} has no module")));
            };
            (
                module,
                fields.get("export").and_then(Value::as_str),
                fields.get("options").filter(|options| !options.is_null()),
            )
        }
        other => return Err(BuildError::bundler("webpack", format!("unsupported plugin {other}"))),
    };

    let mut constructor = format!("require({})", serde_json::to_string(module)?);
    if let Some(export) = export {
        constructor.push_str(&format!("[{}]", serde_json::to_string(export)?));
    }
    let options = options.map(serde_json::to_string).transpose()?.unwrap_or_default();
    Ok(format!("new ({constructor})({options})"))
}

/// `build.custom` as esbuild CLI flags: `{ "keepNames": true, "external": ["a"],
/// "loader": { ".svg": "text" } }` becomes `--keep-names --external:a --loader:.svg=text`.
fn esbuild_flags(custom: Option<&Value>) -> Result<Vec<String>> {
    let custom = match custom {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Object(custom)) => custom,
        Some(_) => return Err(BuildError::bundler("esbuild", "build.custom must be an object")),
    };

    let mut flags = Vec::new();
    for (key, value) in custom {
        let flag = kebab_case(key);
        match value {
            Value::Null => {}
            Value::Bool(true) => flags.push(format!("--{flag}")),
            Value::Array(items) => {
                for item in items {
                    flags.push(format!("--{flag}:{}", flag_value(item)));
                }
            }
            Value::Object(entries) => {
                for (name, item) in entries {
                    flags.push(format!("--{flag}:{name}={}", flag_value(item)));
                }
            }
            scalar => flags.push(format!("--{flag}={}", flag_value(scalar))),
        }
    }
    Ok(flags)
}

fn flag_value(value: &Value) -> String {
    match value {
        Value::String(value) => value.clone(),
        other => other.to_string(),
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// One bundler per [`BundlerKind`].
#[derive(Clone)]
pub struct BundlerSet {
    webpack: Arc<dyn Bundler>,
    esbuild: Arc<dyn Bundler>,
}

impl BundlerSet {
    pub fn new(webpack: Arc<dyn Bundler>, esbuild: Arc<dyn Bundler>) -> Self {
        Self { webpack, esbuild }
    }

    /// Use the same bundler whatever `build.builder` says.
    pub fn single(bundler: Arc<dyn Bundler>) -> Self {
        Self {
            webpack: Arc::clone(&bundler),
            esbuild: bundler,
        }
    }

    pub fn get(&self, kind: BundlerKind) -> Arc<dyn Bundler> {
        match kind {
            BundlerKind::Webpack => Arc::clone(&self.webpack),
            BundlerKind::Esbuild => Arc::clone(&self.esbuild),
        }
    }
}

impl Default for BundlerSet {
    fn default() -> Self {
        Self::new(
            Arc::new(CommandBundler::new(BundlerKind::Webpack)),
            Arc::new(CommandBundler::new(BundlerKind::Esbuild)),
        )
    }
}

impl fmt::Debug for BundlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BundlerSet")
            .field("webpack", &self.webpack.name())
            .field("esbuild", &self.esbuild.name())
            .finish()
    }
}

/// Post-process the bundle: banner for bundlers without one, `node:fs` import for polyfilled production builds.
pub async fn finalize_output(request: &BundleRequest) -> Result<()> {
    let needs_banner = !request.builder.supports_banner() && !request.banner.is_empty();
    let needs_fs = request.polyfills && request.production;
    if !needs_banner && !needs_fs {
        return Ok(());
    }

    let bundled = tokio::fs::read_to_string(&request.output)
        .await
        .map_err(|e| BuildError::read(&request.output, e))?;

    let mut content = String::with_capacity(bundled.len() + request.banner.len() + NODE_FS_IMPORT.len() + 1);
    if needs_fs {
        content.push_str(NODE_FS_IMPORT);
    }
    if needs_banner {
        content.push_str(&request.banner);
        content.push('\n');
    }
    content.push_str(&bundled);

    tokio::fs::write(&request.output, content).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn request(dir: &Path, builder: BundlerKind) -> BundleRequest {
        BundleRequest {
            root: dir.to_path_buf(),
            entry: PathBuf::from("kiln-1.temp.js"),
            builder,
            plugin_config: None,
            define_vars: IndexMap::new(),
            plugins: Vec::new(),
            banner: String::new(),
            polyfills: false,
            output: dir.join(".edge/worker.js"),
            production: true,
        }
    }

    #[test]
    fn unknown_builder_falls_back_to_webpack() {
        assert_eq!(BundlerKind::from_config(None), BundlerKind::Webpack);
        assert_eq!(BundlerKind::from_config(Some("ESBuild")), BundlerKind::Esbuild);
        assert_eq!(BundlerKind::from_config(Some("rollup")), BundlerKind::Webpack);
    }

    #[test]
    fn esbuild_args_carry_defines_and_banner() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Esbuild);
        req.define_vars.insert("DEBUG".into(), "false".into());
        req.banner = "globalThis.kiln = {};".into();

        let args = CommandBundler::new(BundlerKind::Esbuild).args(&req).unwrap();
        assert_eq!(&args[..3], &["--yes", "esbuild", "kiln-1.temp.js"]);
        assert!(args.contains(&"--minify".to_string()));
        assert!(args.contains(&"--define:DEBUG=false".to_string()));
        assert!(args.contains(&"--banner:js=globalThis.kiln = {};".to_string()));
    }

    #[test]
    fn esbuild_args_carry_custom_config() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Esbuild);
        req.plugin_config = Some(json!({
            "keepNames": true,
            "target": "es2020",
            "external": ["sharp"],
            "loader": { ".svg": "text" },
            "sourcemap": null
        }));

        let args = CommandBundler::new(BundlerKind::Esbuild).args(&req).unwrap();
        let tail: Vec<&str> = args.iter().rev().take(4).rev().map(String::as_str).collect();
        assert_eq!(
            tail,
            ["--keep-names", "--target=es2020", "--external:sharp", "--loader:.svg=text"]
        );
    }

    #[test]
    fn esbuild_rejects_plugins() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Esbuild);
        req.plugins.push(json!("some-esbuild-plugin"));

        let err = CommandBundler::new(BundlerKind::Esbuild).args(&req).unwrap_err();
        assert!(matches!(err, BuildError::Bundler { .. }));
        assert!(err.to_string().contains("cannot load the 1 prebuild plugin"));
    }

    #[test]
    fn webpack_runs_with_generated_config() {
        let dir = TempDir::new().unwrap();
        let req = request(dir.path(), BundlerKind::Webpack);
        let args = CommandBundler::new(BundlerKind::Webpack).args(&req).unwrap();
        let config = dir.path().join("kiln-1.temp.webpack.config.cjs").display().to_string();
        assert_eq!(args, ["--yes", "webpack", "--config", config.as_str()]);
    }

    #[test]
    fn webpack_config_carries_defines_and_plugins() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Webpack);
        req.production = false;
        req.define_vars.insert("API_URL".into(), "\"https://api.example.com\"".into());
        req.plugin_config = Some(json!({ "devtool": false, "output": { "chunkFormat": false } }));
        req.plugins.push(json!({ "module": "webpack", "export": "ProvidePlugin", "options": { "Buffer": ["buffer", "Buffer"] } }));
        req.plugins.push(json!("node-polyfill-webpack-plugin"));

        let config = webpack_config(&req).unwrap();
        assert!(config.contains(r#"new webpack.DefinePlugin({"API_URL":"\"https://api.example.com\""}),"#));
        assert!(config.contains(r#"const custom = {"devtool":false,"output":{"chunkFormat":false}};"#));
        assert!(config.contains(r#"entry: "./kiln-1.temp.js","#));
        assert!(config.contains(r#"mode: "development","#));
        assert!(config.contains(r#"filename: "worker.js" }"#));
        assert!(config.contains(r#"new (require("webpack")["ProvidePlugin"])({"Buffer":["buffer","Buffer"]}),"#));
        assert!(config.contains(r#"new (require("node-polyfill-webpack-plugin"))(),"#));
    }

    #[test]
    fn webpack_rejects_malformed_plugins() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Webpack);
        req.plugins.push(json!({ "options": {} }));
        assert!(webpack_config(&req).is_err());

        req.plugins.clear();
        req.plugin_config = Some(json!(["not", "an", "object"]));
        assert!(webpack_config(&req).is_err());
    }

    #[tokio::test]
    async fn finalize_prepends_fs_import_then_banner() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Webpack);
        req.polyfills = true;
        req.banner = "globalThis.kiln = {};".into();
        tokio::fs::create_dir_all(dir.path().join(".edge")).await.unwrap();
        tokio::fs::write(&req.output, "bundle();").await.unwrap();

        finalize_output(&req).await.unwrap();
        let out = tokio::fs::read_to_string(&req.output).await.unwrap();
        assert_eq!(out, "import SRC_NODE_FS from \"node:fs\";\nglobalThis.kiln = {};\nbundle();");
    }

    #[tokio::test]
    async fn finalize_leaves_development_esbuild_output_alone() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path(), BundlerKind::Esbuild);
        req.production = false;
        req.polyfills = true;
        req.banner = "b".into();
        // output never written: nothing to do means nothing is read
        finalize_output(&req).await.unwrap();
    }
}

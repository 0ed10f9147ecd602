//! Build environment: the merged configuration every later phase reads.

use std::path::PathBuf;

use kiln_config::{
    BuildOptions, ConfigDiscovery, ConfigValidator, EntryPoints, KilnConfig, SchemaValidator,
    merge_with_user_overrides, write_config,
};

use crate::context::BuildContext;
use crate::entrypoint::{self, ResolvedEntry};
use crate::error::Result;
use crate::preset::Preset;

#[derive(Debug, Clone)]
pub struct Environment {
    /// Preset defaults with the user's configuration applied
    pub config: KilnConfig,
    /// Typed view of `config.build`, flags normalised
    pub build: BuildOptions,
    pub entry: ResolvedEntry,
    /// Set when this run wrote the first project configuration
    pub bootstrapped: Option<PathBuf>,
}

/// Merge configurations, resolve the entry and validate the result.
///
/// With no user configuration, the merged tree is written out as the
/// project's configuration file.
pub fn setup(preset: &Preset, user: Option<&KilnConfig>, ctx: &BuildContext) -> Result<Environment> {
    let mut config = merge_with_user_overrides(&preset.config, user);

    let mut build = config.build()?;
    build.normalize_flags();
    build.preset = Some(preset.name().to_lowercase());
    if let Some(builder) = &ctx.builder {
        build.builder = Some(builder.clone());
    }
    if build.extension.is_none() {
        build.extension = Some(preset.metadata.ext.clone());
    }

    let user_build = user.map(KilnConfig::build).transpose()?;
    let user_entry = user_build.as_ref().and_then(BuildOptions::first_entry);
    let entry = entrypoint::resolve(ctx.entry.as_deref(), user_entry, preset, &ctx.root)?;
    if let Some(path) = entry.path() {
        build.entry = Some(EntryPoints::Single(path.to_string_lossy().into_owned()));
    }

    SchemaValidator.validate(&build)?;
    config.set_build(&build)?;

    tracing::info!(
        preset = %preset.name(),
        polyfills = build.polyfills_enabled(),
        worker = build.worker_enabled(),
        "environment ready"
    );

    let bootstrapped = match user {
        Some(_) => None,
        None => {
            let path = match &ctx.config_path {
                Some(path) => ctx.resolve(path),
                None => ConfigDiscovery::new(&ctx.root).default_config_path(),
            };
            write_config(&path, &config)?;
            Some(path)
        }
    };

    Ok(Environment {
        config,
        build,
        entry,
        bootstrapped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preset::PresetKind;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn preset() -> Preset {
        Preset::new("typescript", PresetKind::Compute).with_ext("ts").with_config(
            KilnConfig::from_value(json!({
                "build": { "entry": "src/index.ts", "worker": false, "preset": "typescript" }
            }))
            .unwrap(),
        )
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "export default () => {}").unwrap();
        dir
    }

    #[test]
    fn user_flags_override_preset_without_losing_entry() {
        let dir = project();
        let user = KilnConfig::from_value(json!({ "build": { "worker": true } })).unwrap();
        let env = setup(&preset(), Some(&user), &BuildContext::new(dir.path())).unwrap();

        assert_eq!(env.build.worker, Some(true));
        assert_eq!(env.build.polyfills, Some(true));
        assert_eq!(env.build.first_entry(), Some("src/index.ts"));
        assert_eq!(env.config.get("build").unwrap()["entry"], "src/index.ts");
        assert!(env.bootstrapped.is_none());
        assert!(!dir.path().join("kiln.config.json").exists());
    }

    #[test]
    fn first_run_writes_merged_config() {
        let dir = project();
        let env = setup(&preset(), None, &BuildContext::new(dir.path())).unwrap();

        let path = env.bootstrapped.expect("bootstrap path");
        assert_eq!(path, dir.path().join("kiln.config.json"));
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["build"]["worker"], false);
        assert_eq!(written["build"]["extension"], "ts");
    }

    #[test]
    fn invalid_extension_is_rejected_before_bootstrap() {
        let dir = project();
        let user = KilnConfig::from_value(json!({ "build": { "extension": "coffee" } })).unwrap();
        let err = setup(&preset(), Some(&user), &BuildContext::new(dir.path())).unwrap_err();
        assert!(matches!(err, crate::BuildError::Config(_)));
    }

    #[test]
    fn builder_override_replaces_configured_bundler() {
        let dir = project();
        let user = KilnConfig::from_value(json!({ "build": { "builder": "webpack" } })).unwrap();
        let ctx = BuildContext::new(dir.path()).builder("esbuild");
        let env = setup(&preset(), Some(&user), &ctx).unwrap();
        assert_eq!(env.build.builder.as_deref(), Some("esbuild"));
    }
}

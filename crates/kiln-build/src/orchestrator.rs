//! The build pipeline.
//!
//! ```text
//! Idle → PresetResolved → EnvironmentSet → Prebuilt → Bundled → Postbuilt → ManifestWritten → Done
//!   └──────────────────────────── any failure ───────────────────────────────→ Failed
//! ```
//!
//! Phases run strictly in order. The first error stops the pipeline; work
//! already done (bootstrap config, storage copies) is left in place.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kiln_config::KilnConfig;
use kiln_manifest::{Manifest, compile, manifest_path, write_manifest};

use crate::bundler::{BundleRequest, BundlerKind, BundlerSet, finalize_output};
use crate::context::BuildContext;
use crate::environment::{self, Environment};
use crate::error::{BuildError, PipelineError, Result};
use crate::prebuild::{self, PreparedBuild};
use crate::preset::{Preset, PresetInput, PresetRegistry, PresetResolver};
use crate::worker;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildPhase {
    #[default]
    Idle,
    PresetResolved,
    EnvironmentSet,
    Prebuilt,
    Bundled,
    Postbuilt,
    ManifestWritten,
    Done,
    Failed,
}

impl BuildPhase {
    /// The state reached after this one, `None` at the ends.
    pub fn next(&self) -> Option<BuildPhase> {
        use BuildPhase::*;
        match self {
            Idle => Some(PresetResolved),
            PresetResolved => Some(EnvironmentSet),
            EnvironmentSet => Some(Prebuilt),
            Prebuilt => Some(Bundled),
            Bundled => Some(Postbuilt),
            Postbuilt => Some(ManifestWritten),
            ManifestWritten => Some(Done),
            Done | Failed => None,
        }
    }

    /// What the pipeline does to reach this state.
    pub fn activity(&self) -> &'static str {
        use BuildPhase::*;
        match self {
            Idle => "starting",
            PresetResolved => "resolving the preset",
            EnvironmentSet => "preparing the build environment",
            Prebuilt => "running prebuild",
            Bundled => "bundling",
            Postbuilt => "running postbuild",
            ManifestWritten => "writing the manifest",
            Done => "finishing",
            Failed => "failing",
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What a successful build produced.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub preset: String,
    pub config: KilnConfig,
    pub bundler: BundlerKind,
    pub output: PathBuf,
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Config file written because the project had none
    pub bootstrapped: Option<PathBuf>,
}

/// Runs one build at a time through the phases above.
#[derive(Debug)]
pub struct BuildOrchestrator {
    registry: PresetRegistry,
    bundlers: BundlerSet,
    phase: BuildPhase,
    history: Vec<BuildPhase>,
}

impl BuildOrchestrator {
    pub fn new(registry: PresetRegistry) -> Self {
        Self {
            registry,
            bundlers: BundlerSet::default(),
            phase: BuildPhase::Idle,
            history: Vec::new(),
        }
    }

    pub fn with_bundlers(mut self, bundlers: BundlerSet) -> Self {
        self.bundlers = bundlers;
        self
    }

    pub fn registry(&self) -> &PresetRegistry {
        &self.registry
    }

    pub fn phase(&self) -> BuildPhase {
        self.phase
    }

    /// Phases entered by the last run, in order.
    pub fn history(&self) -> &[BuildPhase] {
        &self.history
    }

    /// Run the whole pipeline.
    ///
    /// `input` wins over `build.preset` from `user`; `user` is the project's
    /// own configuration, `None` when it has none yet.
    pub async fn run(
        &mut self,
        input: Option<PresetInput>,
        user: Option<KilnConfig>,
        ctx: &BuildContext,
    ) -> std::result::Result<BuildOutcome, PipelineError> {
        self.phase = BuildPhase::Idle;
        self.history = vec![BuildPhase::Idle];

        let preset = self
            .resolve_preset(input, user.as_ref())
            .map_err(|e| self.fail(BuildPhase::PresetResolved, e))?;
        self.advance(BuildPhase::PresetResolved);

        let env = environment::setup(&preset, user.as_ref(), ctx)
            .map_err(|e| self.fail(BuildPhase::EnvironmentSet, e))?;
        if let Some(path) = &env.bootstrapped {
            tracing::info!(path = %path.display(), "no configuration found, wrote defaults");
        }
        self.advance(BuildPhase::EnvironmentSet);

        let prepared = prebuild::execute(&preset, &env.config, &env.build, ctx)
            .await
            .map_err(|e| self.fail(BuildPhase::Prebuilt, e))?;
        self.advance(BuildPhase::Prebuilt);

        let bundler = BundlerKind::from_config(env.build.builder.as_deref());
        let output = self
            .bundle(&preset, &env, &prepared, bundler, ctx)
            .await
            .map_err(|e| self.fail(BuildPhase::Bundled, e))?;
        self.advance(BuildPhase::Bundled);

        if let Some(hook) = &preset.postbuild {
            tracing::info!(preset = %preset.name(), "running postbuild");
            hook.postbuild(&env.config, ctx)
                .await
                .map_err(|e| self.fail(BuildPhase::Postbuilt, e))?;
        }
        self.advance(BuildPhase::Postbuilt);

        let (manifest, manifest_path) =
            write(&env.config, ctx).map_err(|e| self.fail(BuildPhase::ManifestWritten, e))?;
        self.advance(BuildPhase::ManifestWritten);

        self.advance(BuildPhase::Done);
        tracing::info!(output = %output.display(), "build complete");

        Ok(BuildOutcome {
            preset: preset.name().to_string(),
            config: env.config,
            bundler,
            output,
            manifest,
            manifest_path,
            bootstrapped: env.bootstrapped,
        })
    }

    fn resolve_preset(&self, input: Option<PresetInput>, user: Option<&KilnConfig>) -> Result<Arc<Preset>> {
        let input = match input {
            Some(input) => input,
            None => user
                .and_then(KilnConfig::preset_name)
                .map(PresetInput::from)
                .ok_or(BuildError::MissingPreset)?,
        };
        let preset = PresetResolver::new(&self.registry).resolve(input)?;
        tracing::info!(preset = %preset.name(), kind = %preset.metadata.kind, "using preset");
        Ok(preset)
    }

    async fn bundle(
        &self,
        preset: &Preset,
        env: &Environment,
        prepared: &PreparedBuild,
        kind: BundlerKind,
        ctx: &BuildContext,
    ) -> Result<PathBuf> {
        let source = env.entry.source(&ctx.root).await?;
        let code = worker::assemble(
            &source,
            &prepared.entry_injection,
            env.build.worker_enabled(),
            ctx.event,
            env.entry.path(),
        )?;

        let ext = env.build.extension.as_deref().unwrap_or(&preset.metadata.ext);
        let temp = TempEntry::write(&ctx.root, ext, &code).await?;

        let output = ctx.output_path();
        if let Some(parent) = output.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let request = BundleRequest {
            root: ctx.root.clone(),
            entry: temp.relative().to_path_buf(),
            builder: kind,
            plugin_config: env.build.custom.clone(),
            define_vars: prepared.define_vars.clone(),
            plugins: prepared.plugins.clone(),
            banner: prepared.banner.clone(),
            polyfills: env.build.polyfills_enabled(),
            output: output.clone(),
            production: ctx.production,
        };

        let bundler = self.bundlers.get(kind);
        tracing::info!(bundler = bundler.name(), entry = %temp.relative().display(), "bundling");
        bundler.bundle(&request).await?;
        drop(temp);

        finalize_output(&request).await?;
        Ok(output)
    }

    fn advance(&mut self, phase: BuildPhase) {
        debug_assert_eq!(self.phase.next(), Some(phase));
        tracing::debug!(from = %self.phase, to = %phase, "phase transition");
        self.phase = phase;
        self.history.push(phase);
    }

    fn fail(&mut self, phase: BuildPhase, source: BuildError) -> PipelineError {
        tracing::error!(phase = %phase, error = %source, "build failed while {}", phase.activity());
        self.phase = BuildPhase::Failed;
        self.history.push(BuildPhase::Failed);
        PipelineError { phase, source }
    }
}

fn write(config: &KilnConfig, ctx: &BuildContext) -> Result<(Manifest, PathBuf)> {
    let manifest = compile(config)?;
    let path = manifest_path(&ctx.root, ctx.manifest_path.as_deref());
    write_manifest(&manifest, &path)?;
    Ok((manifest, path))
}

/// The generated entry, removed when dropped.
struct TempEntry {
    absolute: PathBuf,
    relative: PathBuf,
}

impl TempEntry {
    async fn write(root: &Path, ext: &str, code: &str) -> Result<Self> {
        let name = format!("kiln-{}.temp.{ext}", chrono::Utc::now().timestamp_millis());
        let absolute = root.join(&name);
        tokio::fs::write(&absolute, code).await?;
        Ok(Self {
            absolute,
            relative: PathBuf::from(name),
        })
    }

    fn relative(&self) -> &Path {
        &self.relative
    }
}

impl Drop for TempEntry {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.absolute) {
            tracing::warn!(path = %self.absolute.display(), error = %e, "could not remove temporary entry");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_form_a_single_chain() {
        let mut phase = BuildPhase::Idle;
        let mut seen = vec![phase];
        while let Some(next) = phase.next() {
            seen.push(next);
            phase = next;
        }
        assert_eq!(seen.len(), 8);
        assert_eq!(phase, BuildPhase::Done);
        assert_eq!(BuildPhase::Failed.next(), None);
    }

    #[test]
    fn pipeline_error_names_the_activity() {
        let err = PipelineError {
            phase: BuildPhase::PresetResolved,
            source: BuildError::MissingPreset,
        };
        assert!(err.to_string().starts_with("build failed while resolving the preset: no preset configured"));
    }
}

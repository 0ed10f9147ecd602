use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use kiln_config::KilnConfig;
use tokio::process::Command;

use crate::context::BuildContext;
use crate::error::{BuildError, Result};
use crate::package_manager::PackageManager;
use crate::prebuild::PrebuildResult;
use crate::storage;

/// Runs before bundling.
///
/// Returning `None` means the hook had nothing to inject; the build then
/// continues with [`PrebuildResult::default`].
#[async_trait]
pub trait PrebuildHook: Send + Sync {
    async fn prebuild(&self, config: &KilnConfig, ctx: &BuildContext) -> Result<Option<PrebuildResult>>;
}

/// Runs after the worker has been bundled.
#[async_trait]
pub trait PostbuildHook: Send + Sync {
    async fn postbuild(&self, config: &KilnConfig, ctx: &BuildContext) -> Result<()>;
}

/// Build a static site with its framework, then publish the output to storage.
#[derive(Debug, Clone)]
pub struct StaticSitePrebuild {
    framework: &'static str,
    /// Package script to run; `None` publishes `out_dir` as it is
    script: Option<&'static str>,
    /// Extra arguments forwarded to the script
    args: Vec<String>,
    out_dir: PathBuf,
    /// Remove `out_dir` once published
    clean: bool,
}

impl StaticSitePrebuild {
    pub fn new(framework: &'static str, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            framework,
            script: Some("build"),
            args: Vec::new(),
            out_dir: out_dir.into(),
            clean: true,
        }
    }

    /// Publish an existing directory without running a build.
    pub fn copy_only(framework: &'static str, dir: impl Into<PathBuf>) -> Self {
        Self {
            framework,
            script: None,
            args: Vec::new(),
            out_dir: dir.into(),
            clean: false,
        }
    }

    pub fn script(mut self, script: &'static str) -> Self {
        self.script = Some(script);
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn out_dir(&self) -> &PathBuf {
        &self.out_dir
    }

    async fn run_script(&self, script: &str, ctx: &BuildContext) -> Result<()> {
        let pm = PackageManager::detect(&ctx.root);
        let args = pm.run_script_args(script, &self.args);
        tracing::info!(framework = self.framework, command = %format!("{} {}", pm, args.join(" ")), "building site");

        let status = Command::new(pm.program())
            .args(&args)
            .current_dir(&ctx.root)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| BuildError::hook("prebuild", format!("failed to run {pm}: {e}")))?;

        if !status.success() {
            return Err(BuildError::hook(
                "prebuild",
                format!("{} build exited with {status}", self.framework),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl PrebuildHook for StaticSitePrebuild {
    async fn prebuild(&self, _config: &KilnConfig, ctx: &BuildContext) -> Result<Option<PrebuildResult>> {
        if let Some(script) = self.script {
            self.run_script(script, ctx).await?;
        }

        let source = ctx.resolve(&self.out_dir);
        if !source.is_dir() {
            return Err(BuildError::hook(
                "prebuild",
                format!("{} output directory not found: {}", self.framework, source.display()),
            ));
        }

        let copied = storage::copy_dir(&source, &ctx.storage_dir()).await?;
        tracing::info!(files = copied, dest = %ctx.storage_dir().display(), "published static files");

        if self.clean {
            tokio::fs::remove_dir_all(&source).await?;
        }
        Ok(None)
    }
}

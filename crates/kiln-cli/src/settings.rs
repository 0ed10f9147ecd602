//! Build settings from defaults, `KILN_*` environment variables and flags.
//!
//! Priority (highest first): command-line flags, environment, defaults.
//! Flags that were not given leave the lower layers untouched.

use std::path::PathBuf;

use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};

use crate::cli::BuildArgs;
use crate::error::Result;

/// Prefix for environment overrides, e.g. `KILN_PRESET=react`.
pub const ENV_PREFIX: &str = "KILN_";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSettings {
    pub preset: Option<String>,
    pub entry: Option<String>,
    pub builder: Option<String>,
    pub production: bool,
    pub firewall: bool,
    pub config: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
}

/// The flags that were actually given; absent ones are skipped so they
/// don't shadow the environment.
#[derive(Serialize)]
struct FlagLayer<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    preset: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    entry: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    builder: Option<&'a str>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    production: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    firewall: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manifest: Option<&'a PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cwd: Option<&'a PathBuf>,
}

impl<'a> From<&'a BuildArgs> for FlagLayer<'a> {
    fn from(args: &'a BuildArgs) -> Self {
        Self {
            preset: args.preset.as_deref(),
            entry: args.entry.as_deref(),
            builder: args.builder.as_deref(),
            production: args.production,
            firewall: args.firewall,
            config: args.config.as_ref(),
            output: args.output.as_ref(),
            manifest: args.manifest.as_ref(),
            cwd: args.cwd.as_ref(),
        }
    }
}

impl BuildSettings {
    pub fn load(args: &BuildArgs) -> Result<Self> {
        let settings: BuildSettings = Self::figment(args).extract()?;
        tracing::debug!(?settings, "build settings");
        Ok(settings)
    }

    pub fn figment(args: &BuildArgs) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(BuildSettings::default()))
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(FlagLayer::from(args)))
    }
}

use clap::{Args, Subcommand};
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the edge worker
    ///
    /// Resolves the preset, merges its defaults with the project configuration,
    /// runs the preset's hooks, bundles the worker and writes the manifest.
    /// A project without a configuration file gets one written on first build.
    Build(BuildArgs),

    /// Compile the routing manifest without bundling
    ///
    /// Legacy flat rules are migrated to the `behavior` form on the way.
    Manifest(ManifestArgs),

    /// List the built-in presets
    Presets(PresetsArgs),
}

/// Arguments for the build command
///
/// Every option can also come from a `KILN_*` environment variable
/// (`KILN_PRESET`, `KILN_PRODUCTION`, ...); flags win over the environment.
#[derive(Args, Debug, Default, Clone)]
pub struct BuildArgs {
    /// Preset to build with
    ///
    /// Overrides `build.preset` from the configuration. See `kiln presets`.
    #[arg(short, long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Entry point, relative to the project root
    ///
    /// Takes precedence over every configured or preset entry.
    #[arg(short, long, value_name = "PATH")]
    pub entry: Option<String>,

    /// Bundler to use (webpack or esbuild)
    #[arg(short, long, value_name = "NAME")]
    pub builder: Option<String>,

    /// Production build: minified output written to `.edge/worker.js`
    #[arg(long)]
    pub production: bool,

    /// Attach the worker to the firewall event instead of fetch
    #[arg(long)]
    pub firewall: bool,

    /// Configuration file, instead of discovering one in the project root
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where to write the bundled worker
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Where to write the manifest (default `.edge/manifest.json`)
    #[arg(long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the manifest command
#[derive(Args, Debug, Default, Clone)]
pub struct ManifestArgs {
    /// Output file
    ///
    /// Defaults to `.edge/manifest.json`. With `--platform` and no `--out`
    /// the payload is printed to stdout.
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Emit the edge platform API payload instead of the runtime manifest
    #[arg(long)]
    pub platform: bool,

    /// Configuration file, instead of discovering one in the project root
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Arguments for the presets command
#[derive(Args, Debug, Default, Clone)]
pub struct PresetsArgs {
    /// Print the presets as JSON
    #[arg(long)]
    pub json: bool,
}

//! Command-line interface definition for kiln.
//!
//! - `kiln build` - resolve a preset, bundle the worker and write the manifest
//! - `kiln manifest` - compile the routing manifest or the platform payload only
//! - `kiln presets` - list the built-in presets

mod commands;
mod tests;

use clap::Parser;

pub use commands::{BuildArgs, Command, ManifestArgs, PresetsArgs};

/// kiln - build edge workers and compile routing manifests
#[derive(Parser, Debug)]
#[command(
    name = "kiln",
    version,
    about = "Build edge workers and compile routing manifests",
    long_about = "kiln turns a JavaScript/TypeScript project into an edge worker.\n\
                  It applies a framework preset, bundles the entry with webpack or esbuild,\n\
                  and compiles the project's routing rules into a manifest for the edge runtime."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

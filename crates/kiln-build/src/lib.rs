//! Preset resolution and the kiln build pipeline.
//!
//! A build resolves a [`Preset`], merges its defaults with the project
//! configuration, runs the preset's prebuild hook, wraps and bundles the
//! worker, runs the postbuild hook and finally writes the routing manifest.
//!
//! ```no_run
//! use kiln_build::{BuildContext, BuildOrchestrator, PresetRegistry};
//! use kiln_config::ConfigDiscovery;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = BuildContext::new(".").production(true);
//! let user = ConfigDiscovery::new(&ctx.root).try_load()?;
//!
//! let mut orchestrator = BuildOrchestrator::new(PresetRegistry::builtin());
//! let outcome = orchestrator.run(Some("javascript".into()), user, &ctx).await?;
//! println!("worker written to {}", outcome.output.display());
//! # Ok(())
//! # }
//! ```

pub mod bundler;
pub mod context;
pub mod entrypoint;
pub mod environment;
pub mod error;
pub mod orchestrator;
pub mod package_manager;
pub mod prebuild;
pub mod preset;
pub mod storage;
pub mod worker;

pub use bundler::{BundleRequest, Bundler, BundlerKind, BundlerSet, CommandBundler};
pub use context::{BuildContext, WorkerEvent};
pub use entrypoint::ResolvedEntry;
pub use environment::Environment;
pub use error::{BuildError, PipelineError, Result};
pub use orchestrator::{BuildOrchestrator, BuildOutcome, BuildPhase};
pub use prebuild::{PrebuildResult, PreparedBuild};
pub use preset::{
    Handler, PostbuildHook, PrebuildHook, Preset, PresetInput, PresetKind, PresetRegistry,
    PresetResolver,
};

//! Command implementations.
//!
//! Each command module exposes an `execute` function taking its parsed
//! arguments.

pub mod build;
pub mod manifest;
pub mod presets;
pub(crate) mod utils;

pub use build::execute as build_execute;
pub use manifest::execute as manifest_execute;
pub use presets::execute as presets_execute;

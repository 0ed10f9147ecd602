pub mod build;
pub mod config;
pub mod discovery;
pub mod error;
pub mod merge;
pub mod validation;

// Re-export main types
pub use build::*;
pub use config::*;
pub use error::*;

// Re-export merge, discovery and validation
pub use discovery::{ConfigDiscovery, ConfigFormat, write_config};
pub use merge::{deep_merge, merge, merge_values, merge_with_user_overrides};
pub use validation::{ConfigValidator, FsValidator, SchemaValidator, validate_fs, validate_schema};

//! CLI error type.
//!
//! Library errors convert in through `#[from]`; [`ResultExt`] attaches paths,
//! hints and context at the call site.
//!
//! ```rust,no_run
//! use kiln_cli::error::{Result, ResultExt};
//! use std::path::Path;
//!
//! fn read(path: &Path) -> Result<String> {
//!     std::fs::read_to_string(path)
//!         .with_path(path)
//!         .with_hint("Pass the configuration with --config")
//! }
//! ```

mod report;

use std::path::PathBuf;

use thiserror::Error;

pub use report::cli_error_to_miette;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] kiln_config::ConfigError),

    #[error("{0}")]
    Pipeline(#[from] kiln_build::PipelineError),

    #[error("Build error: {0}")]
    Build(#[from] kiln_build::BuildError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] kiln_manifest::ManifestError),

    /// Settings could not be extracted from flags and `KILN_*` variables
    #[error("Invalid settings: {0}")]
    Settings(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        CliError::Settings(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CliError>;

pub trait ResultExt<T> {
    /// Turn a missing-file error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    /// Append a hint to the error message.
    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;

    /// Prefix the error message.
    fn context(self, msg: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            match err {
                CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                CliError::Config(kiln_config::ConfigError::Io(io_err))
                    if io_err.kind() == std::io::ErrorKind::NotFound =>
                {
                    CliError::FileNotFound(path.as_ref().to_path_buf())
                }
                other => other,
            }
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}\n\nHint: {}", err, hint))
        })
    }

    fn context(self, msg: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{}: {}", msg, err))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn with_path_names_missing_files() {
        let result: std::result::Result<(), io::Error> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result.with_path("kiln.config.json").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(ref p) if p == &PathBuf::from("kiln.config.json")));
    }

    #[test]
    fn with_path_sees_through_config_io_errors() {
        let result: std::result::Result<(), kiln_config::ConfigError> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone").into());
        let err = result.with_path("custom.json").unwrap_err();
        assert!(err.to_string().contains("custom.json"));
    }

    #[test]
    fn with_path_keeps_other_errors() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        let err = result.with_path("x").unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn with_hint_appends_hint() {
        let result: Result<()> = Err(CliError::InvalidArgument("bad".into()));
        let msg = result.with_hint("try again").unwrap_err().to_string();
        assert!(msg.contains("Invalid argument: bad"));
        assert!(msg.ends_with("Hint: try again"));
    }

    #[test]
    fn context_prefixes_message() {
        let result: Result<()> = Err(CliError::Custom("inner".into()));
        assert_eq!(result.context("outer").unwrap_err().to_string(), "outer: inner");
    }

    #[test]
    fn pipeline_errors_keep_their_message() {
        let err = CliError::from(kiln_build::PipelineError {
            phase: kiln_build::BuildPhase::PresetResolved,
            source: kiln_build::BuildError::MissingPreset,
        });
        assert!(err.to_string().starts_with("build failed while resolving the preset"));
    }
}

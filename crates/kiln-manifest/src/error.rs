//! Error types for manifest compilation and platform payload generation.

use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ManifestError>;

/// A single problem found while validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// JSON-path-like location, e.g. `rules.request[2].match`
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("invalid configuration ({} issue(s)):\n{}", .0.len(), format_issues(.0))]
    Validation(Vec<ValidationIssue>),

    #[error("{strategy} payload: {message}")]
    Platform {
        strategy: &'static str,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ManifestError {
    pub(crate) fn platform(strategy: &'static str, message: impl Into<String>) -> Self {
        Self::Platform {
            strategy,
            message: message.into(),
        }
    }

    /// Issues carried by a validation failure, empty for other errors.
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation(issues) => issues,
            _ => &[],
        }
    }
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("  - {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

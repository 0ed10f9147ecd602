//! Miette rendering for CLI errors.
//!
//! Messages carry their hints inline as `...\n\nHint: ...`; the hint is
//! moved into the report's help section.

use miette::Report;

use crate::error::CliError;

const HINT_MARKER: &str = "\n\nHint: ";

/// Convert a [`CliError`] into a miette report.
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Manifest(kiln_manifest::ManifestError::Validation(issues)) => {
            let listed: Vec<String> = issues.iter().map(|issue| format!("  - {issue}")).collect();
            miette::miette!(
                help = "Each rule needs a name, a match pattern and known behaviors; origins must be declared before use",
                "Invalid configuration ({} issue(s)):\n{}",
                issues.len(),
                listed.join("\n")
            )
        }
        other => with_help(&other.to_string()),
    }
}

fn with_help(message: &str) -> Report {
    match message.split_once(HINT_MARKER) {
        Some((head, hint)) => miette::miette!(help = hint.to_string(), "{}", head),
        None => miette::miette!("{}", message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_build::{BuildError, BuildPhase, PipelineError};
    use kiln_manifest::{ManifestError, ValidationIssue};

    #[test]
    fn hint_moves_to_help() {
        let report = cli_error_to_miette(CliError::from(PipelineError {
            phase: BuildPhase::PresetResolved,
            source: BuildError::MissingPreset,
        }));
        assert!(!report.to_string().contains("Hint:"));
        let help = report.help().map(|h| h.to_string()).unwrap_or_default();
        assert!(help.contains("--preset"));
    }

    #[test]
    fn validation_issues_are_listed() {
        let report = cli_error_to_miette(CliError::from(ManifestError::Validation(vec![
            ValidationIssue::new("rules.request[0].name", "missing"),
            ValidationIssue::new("rules.request[1].match", "missing"),
        ])));
        let message = report.to_string();
        assert!(message.contains("2 issue(s)"));
        assert!(message.contains("rules.request[1].match: missing"));
        assert!(report.help().is_some());
    }

    #[test]
    fn plain_errors_have_no_help() {
        let report = cli_error_to_miette(CliError::Custom("boom".into()));
        assert_eq!(report.to_string(), "boom");
        assert!(report.help().is_none());
    }
}

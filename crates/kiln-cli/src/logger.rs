//! Logging setup on top of `tracing`.
//!
//! - `--verbose`: debug level for the kiln crates
//! - `--quiet`: errors only
//! - otherwise `RUST_LOG`, falling back to info
//!
//! ```rust,no_run
//! use kiln_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("starting build");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "kiln=debug,kiln_cli=debug,kiln_build=debug,kiln_config=debug,kiln_manifest=debug";
const QUIET_FILTER: &str = "kiln=error,kiln_cli=error,kiln_build=error,kiln_config=error,kiln_manifest=error";
const DEFAULT_FILTER: &str = "kiln=info,kiln_cli=info,kiln_build=info,kiln_config=info,kiln_manifest=info";

/// Build the filter for the given flags.
///
/// `verbose` wins over `quiet`; `RUST_LOG` is only consulted when neither is set.
pub fn filter_for(verbose: bool, quiet: bool) -> EnvFilter {
    if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for `kiln manifest --platform` and `kiln presets --json`.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    init_logger_with_filter(filter_for(verbose, quiet), no_color);
}

/// Install the global subscriber with a custom filter.
///
/// A second call is a no-op: only the first subscriber stays installed.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_filter_enables_debug() {
        let filter = filter_for(true, false);
        assert!(filter.to_string().contains("kiln_build=debug"));
    }

    #[test]
    fn quiet_filter_is_errors_only() {
        let filter = filter_for(false, true);
        assert!(filter.to_string().contains("kiln_manifest=error"));
        assert!(!filter.to_string().contains("info"));
    }

    #[test]
    fn init_twice_does_not_panic() {
        init_logger(false, true, true);
        init_logger(true, false, true);
    }
}

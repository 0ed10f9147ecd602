//! Spinner for work of unknown length.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

use super::{colors_enabled, is_ci};

/// Hidden when stderr is not a terminal or when running under CI.
pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = if Self::should_show() {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_strings(&["◐", "◓", "◑", "◒", "●"]));
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// `false` in CI or when stderr is not a terminal.
    pub fn should_show() -> bool {
        console::user_attended_stderr() && !is_ci()
    }

    /// Stop with a green check.
    pub fn finish(&self, message: &str) {
        let mark = if colors_enabled() { "✓".green().to_string() } else { "✓".to_string() };
        self.pb.finish_with_message(format!("{mark} {message}"));
    }

    /// Stop with a red cross.
    pub fn fail(&self, message: &str) {
        let mark = if colors_enabled() { "✗".red().to_string() } else { "✗".to_string() };
        self.pb.finish_with_message(format!("{mark} {message}"));
    }

    /// Remove the spinner line without a final message.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn spinner_lifecycle() {
        let spinner = Spinner::new("Loading...");
        spinner.finish("Done");
    }

    #[test]
    #[serial]
    fn spinner_is_hidden_in_ci() {
        unsafe { std::env::set_var("CI", "true") };
        assert!(!Spinner::should_show());
        assert!(Spinner::new("Building...").pb.is_hidden());
        unsafe { std::env::remove_var("CI") };
    }

    #[test]
    fn spinner_fail_and_clear() {
        Spinner::new("Processing").fail("Failed");
        Spinner::new("Processing").clear();
    }
}

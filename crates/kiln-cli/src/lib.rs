//! Command-line interface for kiln.
//!
//! - [`cli`] - argument definitions
//! - `commands` - `build`, `manifest` and `presets`
//! - [`settings`] - flag, environment and default layering for `build`
//! - [`error`] - CLI errors and their miette rendering
//! - [`logger`] / [`ui`] - tracing setup and terminal output
//!
//! ```rust,no_run
//! use kiln_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod settings;
pub mod ui;

pub use error::{CliError, Result, ResultExt};

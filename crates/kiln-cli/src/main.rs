//! kiln - build edge workers and compile routing manifests.

use clap::Parser;
use kiln_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Manifest(manifest_args) => commands::manifest_execute(manifest_args).await,
        cli::Command::Presets(presets_args) => commands::presets_execute(presets_args),
    };

    result.map_err(error::cli_error_to_miette)
}

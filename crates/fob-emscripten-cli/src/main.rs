//! fob-emscripten CLI entry point.
//!
//! Parses arguments, sets up logging and colors, then dispatches to the
//! selected command.

use clap::Parser;
use fob_emscripten_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Patch(patch_args) => commands::patch_execute(patch_args).await,
        cli::Command::Check(check_args) => commands::check_execute(check_args).await,
        cli::Command::Watch(watch_args) => commands::watch_execute(watch_args).await,
    };

    // Convert CLI errors to miette diagnostics for error reporting
    result.map_err(error::cli_error_to_miette)
}

//! Logging setup for the fob-emscripten CLI.
//!
//! Patch and rebuild progress is reported through `tracing` by the plugin
//! crate; this module decides how much of it reaches the terminal.
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_emscripten_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! ```

use fob_plugin_emscripten::logging::{LogLevel, LoggingConfig};

const CLI_TARGET: &str = "fob_emscripten_cli";

/// Build the logging config for the given flags.
///
/// Precedence: `--verbose`, then `--quiet`, then `RUST_LOG`, then info level
/// for the fob crates.
pub fn config_for(verbose: bool, quiet: bool, no_color: bool) -> LoggingConfig {
    let config = LoggingConfig::new()
        .with_target(CLI_TARGET)
        .with_ansi(!no_color);

    if verbose {
        config.with_level(LogLevel::Debug)
    } else if quiet {
        config.with_level(LogLevel::Error)
    } else {
        config
    }
}

/// Initialize the tracing subscriber.
///
/// Call once at startup, before any logging occurs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    config_for(verbose, quiet, no_color).init();
}

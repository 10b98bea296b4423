//! Command-line front end for `fob-plugin-emscripten`.
//!
//! Runs the loader patches outside of a bundler and drives native rebuilds
//! from a file watcher.
//!
//! - [`commands`] - `patch`, `check` and `watch`
//! - [`error`] - CLI error type and miette conversion
//! - [`logger`] - tracing subscriber setup
//! - [`ui`] - colored status lines
//! - [`watcher`] - notify-backed file event source

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod ui;
pub mod watcher;

pub use error::{CliError, Result, ResultExt};

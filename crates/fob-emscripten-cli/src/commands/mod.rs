//! Command implementations for the fob-emscripten CLI.
//!
//! - [`patch`] - Patch a loader and write it as a build would
//! - [`check`] - Dry-run report of which patches apply
//! - [`watch`] - Native rebuilds on source changes
//!
//! Each command provides an `execute` function taking its parsed arguments.

pub mod check;
pub mod patch;
pub(crate) mod utils;
pub mod watch;

pub use check::execute as check_execute;
pub use patch::execute as patch_execute;
pub use watch::execute as watch_execute;

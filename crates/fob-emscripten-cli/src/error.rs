//! Error handling for the fob-emscripten CLI.
//!
//! Plugin errors carry their own miette diagnostics and are passed through
//! unchanged; CLI-level failures are rendered from their display text.

use fob_plugin_emscripten::{ConfigError, PostWriteError};
use miette::Report;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The emitted loader could not be post-patched
    #[error(transparent)]
    PostWrite(#[from] PostWriteError),

    /// Invalid command-line arguments or options
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// File or directory not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// I/O errors from file system operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File watching errors
    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// Some requested patches did not apply
    #[error("{count} patch(es) would not apply\n\nHint: the loader was probably generated by an incompatible Emscripten version")]
    PatchesFailed {
        /// Number of failed patches
        count: usize,
    },
}

/// Result type alias using `CliError` as the default error type.
pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Extension trait for attaching the offending path to I/O failures.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }
}

/// Convert a CLI error into a miette report for display
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Config(e) => Report::new(e),
        CliError::PostWrite(e) => Report::new(e),
        _ => miette::miette!("{}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_ext_with_path() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "file not found",
        ));

        let err = result.with_path("/project/dist-wasm/index.js").unwrap_err();
        assert!(matches!(err, CliError::FileNotFound(_)));
        assert!(err.to_string().contains("dist-wasm/index.js"));
    }

    #[test]
    fn test_result_ext_with_path_keeps_other_errors() {
        let result: std::io::Result<()> = Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "denied",
        ));

        let err = result.with_path("/project/index.js").unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_plugin_errors_keep_diagnostics() {
        let err: CliError = ConfigError::NotFound(PathBuf::from("custom.toml")).into();
        let report = cli_error_to_miette(err);
        let code = report.code().map(|code| code.to_string());
        assert_eq!(code.as_deref(), Some("fob::emscripten::config_not_found"));
    }
}

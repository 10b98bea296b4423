//! Error types for the Emscripten plugin
//!
//! Nothing in here is fatal to the surrounding build. Patch failures are
//! values carried inside a [`PatchOutcome`](crate::PatchOutcome), and the
//! other errors are logged at the point of detection by the stage or
//! coordinator that produced them.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Why a single transformation did not change the text
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
pub enum PatchFailure {
    /// The fragment the transformation keys on is absent
    #[error("Could not find {pattern}")]
    #[diagnostic(
        code(fob::emscripten::pattern_not_found),
        help("The loader was probably generated by an incompatible Emscripten version")
    )]
    PatternNotFound {
        patch: &'static str,
        pattern: &'static str,
    },

    /// The fragment exists but already carries this transformation's edit
    #[error("{patch} has already been applied")]
    #[diagnostic(code(fob::emscripten::already_applied))]
    AlreadyApplied { patch: &'static str },
}

impl PatchFailure {
    pub fn pattern_not_found(patch: &'static str, pattern: &'static str) -> Self {
        Self::PatternNotFound { patch, pattern }
    }

    pub fn already_applied(patch: &'static str) -> Self {
        Self::AlreadyApplied { patch }
    }

    /// Name of the transformation that failed
    pub fn patch(&self) -> &'static str {
        match self {
            Self::PatternNotFound { patch, .. } | Self::AlreadyApplied { patch } => patch,
        }
    }

    /// Whether the failure means the edit is already present
    pub fn is_already_applied(&self) -> bool {
        matches!(self, Self::AlreadyApplied { .. })
    }
}

/// Errors from the on-disk fallback stage
#[derive(Error, Debug, Diagnostic)]
pub enum PostWriteError {
    /// The emitted loader is not where the output format says it should be
    #[error("File not found: {}", .0.display())]
    #[diagnostic(
        code(fob::emscripten::loader_not_found),
        help("Check that the output file name follows index.<format>.js")
    )]
    FileNotFound(PathBuf),

    /// Reading or writing the emitted loader failed
    #[error("Failed to access {}: {source}", .path.display())]
    #[diagnostic(code(fob::emscripten::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The loader was found but the patch did not apply
    #[error(transparent)]
    #[diagnostic(transparent)]
    Patch(#[from] PatchFailure),
}

impl PostWriteError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from running the external rebuild command
#[derive(Error, Debug, Diagnostic)]
pub enum RebuildError {
    /// The command could not be started
    #[error("Failed to spawn `{command}`: {source}")]
    #[diagnostic(
        code(fob::emscripten::spawn_failed),
        help("Check that the rebuild command is installed and on your PATH")
    )]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and exited unsuccessfully
    #[error("`{command}` exited with {status}")]
    #[diagnostic(code(fob::emscripten::rebuild_failed))]
    Exit {
        command: String,
        code: Option<i32>,
        status: String,
        #[help]
        stderr: String,
    },
}

impl RebuildError {
    pub fn spawn(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            command: command.into(),
            source,
        }
    }

    pub fn exit(command: impl Into<String>, code: Option<i32>, stderr: impl Into<String>) -> Self {
        let status = match code {
            Some(code) => format!("code {code}"),
            None => "a signal".to_string(),
        };
        Self::Exit {
            command: command.into(),
            code,
            status,
            stderr: stderr.into(),
        }
    }
}

/// Errors from loading plugin configuration
#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {}", .0.display())]
    #[diagnostic(code(fob::emscripten::config_not_found))]
    NotFound(PathBuf),

    /// A source could not be parsed or a value has the wrong type
    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(fob::emscripten::invalid_config),
        help("Check fob-emscripten.toml and FOB_EMSCRIPTEN_* variables")
    )]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_not_found_message() {
        let err = PatchFailure::pattern_not_found("electron-shim", "ENVIRONMENT_IS_NODE");
        assert_eq!(err.to_string(), "Could not find ENVIRONMENT_IS_NODE");
        assert_eq!(err.patch(), "electron-shim");
        assert!(!err.is_already_applied());
    }

    #[test]
    fn test_already_applied() {
        let err = PatchFailure::already_applied("electron-shim");
        assert!(err.is_already_applied());
        assert!(err.to_string().contains("already been applied"));
    }

    #[test]
    fn test_rebuild_exit_message() {
        let err = RebuildError::exit("bun build:wasm", Some(2), "boom");
        assert_eq!(err.to_string(), "`bun build:wasm` exited with code 2");

        let err = RebuildError::exit("make", None, "");
        assert!(err.to_string().ends_with("a signal"));
    }

    #[test]
    fn test_post_write_from_patch() {
        let err: PostWriteError = PatchFailure::pattern_not_found("wasm-url-post", "wasm").into();
        assert!(matches!(err, PostWriteError::Patch(_)));
        assert_eq!(err.to_string(), "Could not find wasm");
    }
}

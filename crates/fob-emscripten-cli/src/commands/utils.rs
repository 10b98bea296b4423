//! Shared utilities for command implementations.

use crate::cli::ConfigArgs;
use crate::error::{CliError, Result, ResultExt};
use fob_plugin_emscripten::EmscriptenConfig;
use std::path::Path;

/// Load layered configuration for the selected project root.
pub fn load_config(args: &ConfigArgs) -> Result<EmscriptenConfig> {
    let config = EmscriptenConfig::load(&args.root, args.config.as_deref())?;
    tracing::debug!(
        "Loaded config from {} (patch: {}, hmr: {})",
        args.root.display(),
        config.patch.is_some(),
        config.hmr.is_some()
    );
    Ok(config)
}

/// Read a loader source file.
///
/// # Errors
///
/// Returns `CliError::FileNotFound` if the file doesn't exist and
/// `CliError::InvalidArgument` if the path is a directory.
pub async fn read_loader(path: &Path) -> Result<String> {
    if path.is_dir() {
        return Err(CliError::InvalidArgument(format!(
            "Loader is a directory: {}",
            path.display()
        )));
    }
    tokio::fs::read_to_string(path).await.with_path(path)
}

/// Module id a bundler would report for `path`, with forward slashes
pub fn module_id(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

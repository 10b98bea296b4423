//! Per-build state threaded from bundle generation to the disk write

use crate::artifact::OutputFormat;
use std::path::{Path, PathBuf};

/// Output directory used when the host names neither a directory nor a file
pub const DEFAULT_OUT_DIR: &str = "dist";

/// Resolve where a host writes its chunks: `dir` wins, then the parent of
/// `file`, then [`DEFAULT_OUT_DIR`], all relative to `cwd`
pub fn resolve_out_dir(cwd: &Path, dir: Option<&str>, file: Option<&str>) -> PathBuf {
    if let Some(dir) = dir {
        return cwd.join(dir);
    }
    match file.and_then(|file| Path::new(file).parent()) {
        Some(parent) => cwd.join(parent),
        None => cwd.join(DEFAULT_OUT_DIR),
    }
}

/// State one build carries between its stages.
///
/// A fresh context is created for every build, so nothing resolved by a
/// previous build (such as its output format) leaks into the next one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    out_dir: PathBuf,
    format: Option<OutputFormat>,
    loader_post_patched: bool,
}

impl BuildContext {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            format: None,
            loader_post_patched: false,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Output format recorded at bundle generation, if that stage ran
    pub fn format(&self) -> Option<OutputFormat> {
        self.format
    }

    pub fn set_format(&mut self, format: OutputFormat) {
        self.format = Some(format);
    }

    /// Whether the bundled loader chunk already received the post-bundle
    /// WASM URL patch in memory
    pub fn loader_post_patched(&self) -> bool {
        self.loader_post_patched
    }

    pub(crate) fn mark_loader_post_patched(&mut self) {
        self.loader_post_patched = true;
    }
}

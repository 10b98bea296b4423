//! Locating the Emscripten loader at each build stage
//!
//! The loader has no stable identifier across the build: before bundling it
//! is a module id, after bundling a chunk file name, and after writing a path
//! derived from the output format. [`ArtifactId`] is computed once and owns
//! all three addressing rules so the stages never re-derive them.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Path fragment that identifies the generated loader module
pub const LOADER_MODULE_FRAGMENT: &str = "dist-wasm/index.js";

/// File stem of the emitted loader (`index.<format>.js`)
pub const LOADER_OUTPUT_STEM: &str = "index";

/// Build lifecycle point at which the loader may be edited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Module text before the bundler links the graph
    PreTransform,
    /// Bundled chunk text, before it is written
    PostBundle,
    /// The emitted file on disk
    PostWrite,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::PreTransform => "pre-transform",
            Stage::PostBundle => "post-bundle",
            Stage::PostWrite => "post-write",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output module format, as named in emitted file names
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ES modules (`index.es.js`)
    #[default]
    Es,
    Cjs,
    Iife,
    Umd,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Es => "es",
            OutputFormat::Cjs => "cjs",
            OutputFormat::Iife => "iife",
            OutputFormat::Umd => "umd",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "es" | "esm" | "module" => Ok(OutputFormat::Es),
            "cjs" | "commonjs" => Ok(OutputFormat::Cjs),
            "iife" => Ok(OutputFormat::Iife),
            "umd" => Ok(OutputFormat::Umd),
            other => Err(format!("Invalid output format: {}", other)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stage-specific reference to a file that might be the loader
#[derive(Debug, Clone, Copy)]
pub enum ArtifactHandle<'a> {
    Module { id: &'a str },
    /// A chunk, with the ids of the modules bundled into it
    Chunk {
        file_name: &'a str,
        modules: &'a [String],
    },
    File { path: &'a Path },
}

impl ArtifactHandle<'_> {
    pub fn stage(&self) -> Stage {
        match self {
            ArtifactHandle::Module { .. } => Stage::PreTransform,
            ArtifactHandle::Chunk { .. } => Stage::PostBundle,
            ArtifactHandle::File { .. } => Stage::PostWrite,
        }
    }
}

/// Identity of the loader artifact across all stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactId {
    module_fragment: String,
    output_stem: String,
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new(LOADER_MODULE_FRAGMENT, LOADER_OUTPUT_STEM)
    }
}

impl ArtifactId {
    pub fn new(module_fragment: impl Into<String>, output_stem: impl Into<String>) -> Self {
        Self {
            module_fragment: module_fragment.into(),
            output_stem: output_stem.into(),
        }
    }

    pub fn module_fragment(&self) -> &str {
        &self.module_fragment
    }

    /// Whether a module id (before bundling) is the loader
    pub fn matches_module(&self, id: &str) -> bool {
        normalize_separators(id).contains(&self.module_fragment)
    }

    /// Whether a bundle entry is the loader, either by its own name or by
    /// the modules it was bundled from
    pub fn matches_chunk(&self, file_name: &str, modules: &[String]) -> bool {
        normalize_separators(file_name).contains(&self.module_fragment)
            || modules.iter().any(|id| self.matches_module(id))
    }

    /// File name the loader is emitted under for `format`
    pub fn output_file_name(&self, format: OutputFormat) -> String {
        format!("{}.{}.js", self.output_stem, format.as_str())
    }

    /// Where the loader lands on disk for `format`
    pub fn output_path(&self, out_dir: &Path, format: OutputFormat) -> PathBuf {
        out_dir.join(self.output_file_name(format))
    }

    /// Whether `handle` refers to the loader; on-disk paths are compared
    /// against the emitted file name for `format`
    pub fn is_target(&self, handle: ArtifactHandle<'_>, format: OutputFormat) -> bool {
        match handle {
            ArtifactHandle::Module { id } => self.matches_module(id),
            ArtifactHandle::Chunk { file_name, modules } => {
                self.matches_chunk(file_name, modules)
            }
            ArtifactHandle::File { path } => path
                .file_name()
                .is_some_and(|name| name == self.output_file_name(format).as_str()),
        }
    }
}

fn normalize_separators(path: &str) -> std::borrow::Cow<'_, str> {
    if path.contains('\\') {
        path.replace('\\', "/").into()
    } else {
        path.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_module_by_fragment() {
        let id = ArtifactId::default();
        assert!(id.matches_module("/home/me/app/dist-wasm/index.js"));
        assert!(id.matches_module("/home/me/app/dist-wasm/index.js?import"));
        assert!(id.matches_module(r"C:\app\dist-wasm\index.js"));
        assert!(!id.matches_module("/home/me/app/src/index.js"));
    }

    #[test]
    fn test_output_path_uses_format() {
        let id = ArtifactId::default();
        assert_eq!(
            id.output_path(Path::new("dist"), OutputFormat::Cjs),
            PathBuf::from("dist/index.cjs.js")
        );
        assert_eq!(id.output_file_name(OutputFormat::default()), "index.es.js");
    }

    #[test]
    fn test_is_target_per_stage() {
        let id = ArtifactId::default();
        let path = PathBuf::from("dist/index.umd.js");

        let chunk = ArtifactHandle::Chunk {
            file_name: "dist-wasm/index.js",
            modules: &[],
        };
        assert!(id.is_target(chunk, OutputFormat::Es));
        assert!(id.is_target(ArtifactHandle::File { path: &path }, OutputFormat::Umd));
        assert!(!id.is_target(ArtifactHandle::File { path: &path }, OutputFormat::Es));
        assert_eq!(ArtifactHandle::File { path: &path }.stage(), Stage::PostWrite);
    }

    #[test]
    fn test_matches_chunk_by_bundled_module() {
        let id = ArtifactId::default();
        let modules = vec![
            "/app/src/main.js".to_string(),
            "/app/dist-wasm/index.js".to_string(),
        ];

        assert!(id.matches_chunk("index.es.js", &modules));
        assert!(!id.matches_chunk("index.es.js", &modules[..1]));
        assert!(!id.matches_chunk("index.es.js", &[]));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("esm".parse::<OutputFormat>().unwrap(), OutputFormat::Es);
        assert_eq!("ES".parse::<OutputFormat>().unwrap(), OutputFormat::Es);
        assert_eq!("iife".parse::<OutputFormat>().unwrap(), OutputFormat::Iife);
        assert!("amd".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Umd.to_string(), "umd");
    }
}

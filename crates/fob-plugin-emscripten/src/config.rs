//! Emscripten plugin configuration types
//!
//! Every section is optional. A missing `[patch]` section disables loader
//! patching entirely and a missing `[hmr]` section disables native rebuilds,
//! so the plugin does nothing unless asked to.
//!
//! ```toml
//! [patch]
//! add_electron_support = true
//! disable_inline_wasm = true
//!
//! [hmr]
//! watch_dirs = ["src-wasm"]
//! command = "make -C src-wasm"
//! ```

use crate::error::ConfigError;
use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Conventional config file name, looked up in the project root
pub const CONFIG_FILE_NAME: &str = "fob-emscripten.toml";

/// Prefix for environment overrides; nested keys are separated by `__`
/// (e.g. `FOB_EMSCRIPTEN_HMR__DEBOUNCE_MS=100`)
pub const ENV_PREFIX: &str = "FOB_EMSCRIPTEN_";

/// Top-level plugin configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmscriptenConfig {
    /// Loader patching; `None` disables it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<PatchOptions>,

    /// Native rebuilds on source changes; `None` disables them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hmr: Option<HmrOptions>,
}

impl EmscriptenConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patch(mut self, patch: PatchOptions) -> Self {
        self.patch = Some(patch);
        self
    }

    pub fn with_hmr(mut self, hmr: HmrOptions) -> Self {
        self.hmr = Some(hmr);
        self
    }

    /// Load configuration from layered sources.
    ///
    /// Priority: environment variables > config file > defaults. The config
    /// file is `explicit` when given (it must exist), otherwise
    /// [`CONFIG_FILE_NAME`] under `root` if present.
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        let config_file = match explicit {
            Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => {
                let default_path = root.join(CONFIG_FILE_NAME);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_file {
            tracing::debug!("[fob-emscripten] Loading config from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        Self::from_figment(figment)
    }

    /// Extract configuration from a caller-assembled figment
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }
}

/// Which loader transformations to run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOptions {
    /// Treat Electron renderers as web rather than Node
    #[serde(default)]
    pub add_electron_support: bool,

    /// Keep the WASM binary as a separate asset: drop the URL base before
    /// bundling and restore `import.meta.url` afterwards
    #[serde(default)]
    pub disable_inline_wasm: bool,

    /// Hoist the pthread worker URL out of the `new Worker(..)` call
    #[serde(default)]
    pub hoist_worker_url: bool,
}

impl PatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_electron_support(mut self, enabled: bool) -> Self {
        self.add_electron_support = enabled;
        self
    }

    pub fn with_inline_wasm_disabled(mut self, disabled: bool) -> Self {
        self.disable_inline_wasm = disabled;
        self
    }

    pub fn with_worker_hoisting(mut self, enabled: bool) -> Self {
        self.hoist_worker_url = enabled;
        self
    }

    /// Whether any transformation is requested
    pub fn is_empty(&self) -> bool {
        !(self.add_electron_support || self.disable_inline_wasm || self.hoist_worker_url)
    }
}

/// Native rebuild settings for serve mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrOptions {
    /// Directories whose changes trigger a rebuild
    #[serde(default = "default_watch_dirs")]
    pub watch_dirs: Vec<PathBuf>,

    /// File suffixes that never trigger a rebuild (build outputs)
    #[serde(default = "default_ignore_exts")]
    pub ignore_exts: Vec<String>,

    /// Quiet period after the last change before rebuilding
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Shell command that regenerates the loader and binary
    #[serde(default = "default_command")]
    pub command: String,
}

impl Default for HmrOptions {
    fn default() -> Self {
        Self {
            watch_dirs: default_watch_dirs(),
            ignore_exts: default_ignore_exts(),
            debounce_ms: default_debounce_ms(),
            command: default_command(),
        }
    }
}

impl HmrOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the watched directories
    pub fn with_watch_dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.watch_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the ignored extensions
    pub fn with_ignore_exts<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_exts = exts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

fn default_watch_dirs() -> Vec<PathBuf> {
    vec![PathBuf::from("src-wasm"), PathBuf::from("src-wasm-assets")]
}

fn default_ignore_exts() -> Vec<String> {
    vec![".o".to_string()]
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_command() -> String {
    "bun build:wasm".to_string()
}

//! Subscriber setup for hosts and tools embedding the plugin
//!
//! Only available with the `logging` feature. The plugin emits `tracing`
//! events under its own crate target; [`LoggingConfig`] builds the filter
//! for that target plus any the host adds (a CLI adds its own crate) and
//! installs a compact fmt subscriber.
//!
//! # Example
//!
//! ```rust,no_run
//! use fob_plugin_emscripten::logging::{LogLevel, LoggingConfig};
//!
//! LoggingConfig::new()
//!     .with_target("my_tool")
//!     .with_level(LogLevel::Debug)
//!     .init();
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing target of every event the plugin emits
pub const PLUGIN_TARGET: &str = "fob_plugin_emscripten";

/// Verbosity applied to every configured target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    Silent,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Silent => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

/// Which targets to show, how loudly, and whether to color the output
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    level: Option<LogLevel>,
    targets: Vec<String>,
    ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggingConfig {
    /// Plugin target only, level taken from `RUST_LOG` (info when unset)
    pub fn new() -> Self {
        Self {
            level: None,
            targets: vec![PLUGIN_TARGET.to_string()],
            ansi: true,
        }
    }

    /// Fix the level; `RUST_LOG` is then ignored
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Also filter `target` at the configured level
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// `target=level` directives for every configured target
    pub fn directives(&self, level: LogLevel) -> String {
        self.targets
            .iter()
            .map(|target| format!("{}={}", target, level.directive()))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn filter(&self) -> EnvFilter {
        match self.level {
            Some(level) => EnvFilter::new(self.directives(level)),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(self.directives(LogLevel::default()))),
        }
    }

    /// Install the global subscriber. Returns `false` when one was already
    /// set, in which case the existing subscriber stays in place.
    pub fn init(&self) -> bool {
        let layer = fmt::layer()
            .compact()
            .with_target(false)
            .with_level(true)
            .with_ansi(self.ansi)
            .without_time();

        tracing_subscriber::registry()
            .with(self.filter())
            .with(layer)
            .try_init()
            .is_ok()
    }
}

//! Bundler plugin for Emscripten output
//!
//! Emscripten emits a JavaScript loader (`dist-wasm/index.js`) next to the
//! WASM binary. This crate edits that loader at three points of a build so
//! it behaves in the target environment, and in dev mode rebuilds the native
//! sources when they change.
//!
//! ## Architecture
//!
//! ```text
//! module text ──► pre_transform ──► bundler ──► post_bundle ──► disk ──► post_write
//!                 (electron-shim,              (electron-shim,          (wasm-url-post,
//!                  wasm-url-pre,                wasm-url-post)           fallback)
//!                  worker-hoist)
//!
//! file events ──► RebuildCoordinator ──(debounced, single flight)──► build command
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fob_plugin_emscripten::{BuildMode, EmscriptenConfig, EmscriptenPlugin, PatchOptions};
//!
//! let config = EmscriptenConfig::new().with_patch(
//!     PatchOptions::new()
//!         .with_electron_support(true)
//!         .with_inline_wasm_disabled(true),
//! );
//! let plugin = EmscriptenPlugin::from_config(config, BuildMode::Build);
//! plugin.begin_build("dist");
//! ```
//!
//! ## Features
//!
//! - `rolldown`: implements rolldown's `Plugin` trait for [`EmscriptenPlugin`]
//! - `logging`: subscriber setup helpers in [`logging`]

mod artifact;
mod config;
mod context;
mod error;
mod hmr;
mod matcher;
mod patches;
mod pipeline;
mod plugin;

#[cfg(feature = "rolldown")]
mod rolldown;

#[cfg(feature = "logging")]
pub mod logging;

pub use artifact::{
    ArtifactHandle, ArtifactId, LOADER_MODULE_FRAGMENT, LOADER_OUTPUT_STEM, OutputFormat, Stage,
};
pub use config::{CONFIG_FILE_NAME, ENV_PREFIX, EmscriptenConfig, HmrOptions, PatchOptions};
pub use context::{BuildContext, DEFAULT_OUT_DIR, resolve_out_dir};
pub use error::{ConfigError, PatchFailure, PostWriteError, RebuildError};
pub use hmr::{
    RebuildCoordinator, RebuildRunner, RebuildState, RebuildStatus, ShellRunner, WatchedFileEvent,
};
pub use matcher::{Pattern, Span, find, find_all, find_in};
pub use patches::{
    ElectronShim, HOISTED_WORKER_URL, PatchKind, PatchOutcome, Transformation, WasmUrlPost,
    WasmUrlPre, WorkerHoist,
};
pub use pipeline::{
    BundleEntry, BundleEntryKind, PatchPipeline, PatchPlan, PatchRequest, PostWriteOutcome,
    StageReport,
};
pub use plugin::{BuildMode, EmscriptenPlugin};

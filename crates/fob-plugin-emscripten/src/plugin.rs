use crate::artifact::OutputFormat;
use crate::config::EmscriptenConfig;
use crate::context::BuildContext;
use crate::hmr::{RebuildCoordinator, RebuildRunner, WatchedFileEvent};
use crate::pipeline::{BundleEntry, PatchPipeline, PostWriteOutcome, StageReport};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// How the host is running the build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    /// One-shot production build; native rebuilds are off
    #[default]
    Build,
    /// Dev server or watch mode; native rebuilds follow source changes
    Serve,
}

/// Emscripten integration for a bundler host
///
/// The host calls the hooks in build order: [`begin_build`], then
/// [`transform`] for each module, [`generate_bundle`] once the chunks exist
/// and [`write_bundle`] after they are on disk. In [`BuildMode::Serve`] it
/// also forwards file changes to [`handle_file_change`].
///
/// Each sub-feature is only active when its config section is present.
///
/// [`begin_build`]: EmscriptenPlugin::begin_build
/// [`transform`]: EmscriptenPlugin::transform
/// [`generate_bundle`]: EmscriptenPlugin::generate_bundle
/// [`write_bundle`]: EmscriptenPlugin::write_bundle
/// [`handle_file_change`]: EmscriptenPlugin::handle_file_change
#[derive(Debug, Clone)]
pub struct EmscriptenPlugin {
    pipeline: Option<PatchPipeline>,
    rebuilds: Option<RebuildCoordinator>,

    /// State of the build in progress, replaced by `begin_build`
    ctx: Arc<Mutex<BuildContext>>,
}

impl EmscriptenPlugin {
    pub fn new(config: EmscriptenConfig) -> Self {
        Self::from_config(config, BuildMode::Build)
    }

    pub fn from_config(config: EmscriptenConfig, mode: BuildMode) -> Self {
        let pipeline = config
            .patch
            .as_ref()
            .filter(|patch| !patch.is_empty())
            .map(PatchPipeline::from_options);

        let rebuilds = match (mode, config.hmr) {
            (BuildMode::Serve, Some(hmr)) => Some(RebuildCoordinator::with_shell(hmr)),
            (BuildMode::Build, Some(_)) => {
                debug!("[fob-emscripten] Native rebuilds are only active in serve mode");
                None
            }
            (_, None) => None,
        };

        Self {
            pipeline,
            rebuilds,
            ctx: Arc::new(Mutex::new(BuildContext::default())),
        }
    }

    /// Run rebuilds through `runner` instead of the shell
    pub fn with_rebuild_runner(mut self, runner: Arc<dyn RebuildRunner>) -> Self {
        self.rebuilds = self
            .rebuilds
            .map(|rebuilds| RebuildCoordinator::new(rebuilds.options().clone(), runner));
        self
    }

    pub fn name(&self) -> &'static str {
        "fob-emscripten"
    }

    pub fn pipeline(&self) -> Option<&PatchPipeline> {
        self.pipeline.as_ref()
    }

    pub fn rebuilds(&self) -> Option<&RebuildCoordinator> {
        self.rebuilds.as_ref()
    }

    /// Snapshot of the current build's context
    pub fn context(&self) -> BuildContext {
        self.ctx.lock().clone()
    }

    /// Start a new build writing to `out_dir`
    pub fn begin_build(&self, out_dir: impl Into<PathBuf>) {
        *self.ctx.lock() = BuildContext::new(out_dir);
    }

    /// Pre-transform hook; `None` leaves the module untouched
    pub fn transform(&self, id: &str, code: &str) -> Option<String> {
        self.pipeline.as_ref()?.pre_transform(id, code)
    }

    /// Post-bundle hook; patches loader chunks in place
    pub fn generate_bundle(
        &self,
        format: OutputFormat,
        bundle: &mut [BundleEntry],
    ) -> StageReport {
        let mut ctx = self.ctx.lock();
        match &self.pipeline {
            Some(pipeline) => pipeline.post_bundle(&mut ctx, format, bundle),
            None => {
                ctx.set_format(format);
                StageReport::default()
            }
        }
    }

    /// Post-write hook.
    ///
    /// Errors were already logged by the stage and are not propagated, so a
    /// broken loader never fails the host's build. Returns `None` when the
    /// stage did not complete.
    pub async fn write_bundle(&self) -> Option<PostWriteOutcome> {
        let pipeline = self.pipeline.as_ref()?;
        let ctx = self.context();
        pipeline.post_write(&ctx).await.ok()
    }

    /// Forward a file change; returns whether it scheduled a rebuild
    pub fn handle_file_change(&self, path: impl AsRef<Path>) -> bool {
        match &self.rebuilds {
            Some(rebuilds) => rebuilds.handle_event(WatchedFileEvent::new(path.as_ref())),
            None => false,
        }
    }
}

impl Default for EmscriptenPlugin {
    fn default() -> Self {
        Self::new(EmscriptenConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HmrOptions, PatchOptions};

    #[test]
    fn test_empty_config_is_inert() {
        let plugin = EmscriptenPlugin::default();
        assert!(plugin.pipeline().is_none());
        assert!(plugin.rebuilds().is_none());
        assert!(
            plugin
                .transform("/app/dist-wasm/index.js", "var ENVIRONMENT_IS_NODE = 1;")
                .is_none()
        );
    }

    #[test]
    fn test_empty_patch_section_is_inert() {
        let config = EmscriptenConfig::new().with_patch(PatchOptions::new());
        assert!(EmscriptenPlugin::new(config).pipeline().is_none());
    }

    #[test]
    fn test_rebuilds_only_in_serve_mode() {
        let config = EmscriptenConfig::new().with_hmr(HmrOptions::default());
        let build = EmscriptenPlugin::from_config(config.clone(), BuildMode::Build);
        let serve = EmscriptenPlugin::from_config(config, BuildMode::Serve);
        assert!(build.rebuilds().is_none());
        assert!(serve.rebuilds().is_some());
    }

    #[test]
    fn test_file_change_ignored_without_hmr() {
        let plugin = EmscriptenPlugin::default();
        assert!(!plugin.handle_file_change("/app/src-wasm/lib.c"));
    }

    #[test]
    fn test_begin_build_resets_context() {
        let plugin = EmscriptenPlugin::default();
        plugin.generate_bundle(OutputFormat::Cjs, &mut []);
        assert_eq!(plugin.context().format(), Some(OutputFormat::Cjs));

        plugin.begin_build("dist");
        let ctx = plugin.context();
        assert_eq!(ctx.out_dir(), Path::new("dist"));
        assert!(ctx.format().is_none());
    }
}

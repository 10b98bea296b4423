//! Stage coordinator for loader patching
//!
//! A build visits three stages in order. At each one the coordinator asks the
//! [`ArtifactId`] whether the file in hand is the loader, then runs the
//! transformations planned for that stage:
//!
//! ```text
//! pre_transform   module text   electron-shim → wasm-url-pre → worker-hoist
//! post_bundle     chunk text    electron-shim → wasm-url-post   (records format)
//! post_write      file on disk  wasm-url-post, unless post_bundle already did it
//! ```
//!
//! Failures never abort the build. In the in-memory stages a failed
//! transformation is logged and the next one runs; on disk a failure aborts
//! the stage and leaves the written file as it is.

use crate::artifact::{ArtifactHandle, ArtifactId, OutputFormat, Stage};
use crate::config::PatchOptions;
use crate::context::BuildContext;
use crate::error::{PatchFailure, PostWriteError};
use crate::patches::PatchKind;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

/// Ordered transformations to run at one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    pub stage: Stage,
    pub patches: Vec<PatchKind>,
}

impl PatchRequest {
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn contains(&self, kind: PatchKind) -> bool {
        self.patches.contains(&kind)
    }
}

/// The per-stage requests derived once from [`PatchOptions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    pre_transform: PatchRequest,
    post_bundle: PatchRequest,
    post_write: PatchRequest,
}

impl PatchPlan {
    pub fn from_options(options: &PatchOptions) -> Self {
        let mut pre = Vec::new();
        let mut post_bundle = Vec::new();
        let mut post_write = Vec::new();

        if options.add_electron_support {
            pre.push(PatchKind::ElectronShim);
            post_bundle.push(PatchKind::ElectronShim);
        }
        if options.disable_inline_wasm {
            pre.push(PatchKind::WasmUrlPre);
            post_bundle.push(PatchKind::WasmUrlPost);
            post_write.push(PatchKind::WasmUrlPost);
        }
        if options.hoist_worker_url {
            pre.push(PatchKind::WorkerHoist);
        }

        Self {
            pre_transform: PatchRequest {
                stage: Stage::PreTransform,
                patches: pre,
            },
            post_bundle: PatchRequest {
                stage: Stage::PostBundle,
                patches: post_bundle,
            },
            post_write: PatchRequest {
                stage: Stage::PostWrite,
                patches: post_write,
            },
        }
    }

    pub fn request(&self, stage: Stage) -> &PatchRequest {
        match stage {
            Stage::PreTransform => &self.pre_transform,
            Stage::PostBundle => &self.post_bundle,
            Stage::PostWrite => &self.post_write,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pre_transform.is_empty() && self.post_bundle.is_empty() && self.post_write.is_empty()
    }
}

/// Payload of one bundle output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEntryKind {
    Chunk { code: String },
    Asset { source: Vec<u8> },
}

/// One entry of the bundle handed to `post_bundle`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub file_name: String,
    /// Ids of the modules bundled into a chunk, when the host reports them
    pub modules: Vec<String>,
    pub kind: BundleEntryKind,
}

impl BundleEntry {
    pub fn chunk(file_name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            modules: Vec::new(),
            kind: BundleEntryKind::Chunk { code: code.into() },
        }
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }

    pub fn asset(file_name: impl Into<String>, source: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            modules: Vec::new(),
            kind: BundleEntryKind::Asset {
                source: source.into(),
            },
        }
    }

    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            BundleEntryKind::Chunk { code } => Some(code),
            BundleEntryKind::Asset { .. } => None,
        }
    }
}

/// What happened to the loader during one in-memory stage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageReport {
    pub applied: Vec<PatchKind>,
    pub failed: Vec<PatchFailure>,
}

impl StageReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    fn merge(&mut self, other: StageReport) {
        self.applied.extend(other.applied);
        self.failed.extend(other.failed);
    }
}

/// Result of a completed on-disk stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostWriteOutcome {
    /// The emitted loader was patched and rewritten
    Patched { path: PathBuf },
    /// Nothing to do: not requested, or already done in memory
    Skipped,
}

/// Drives the patch catalog through the three build stages
#[derive(Debug, Clone)]
pub struct PatchPipeline {
    artifact: ArtifactId,
    plan: PatchPlan,
}

impl PatchPipeline {
    pub fn new(artifact: ArtifactId, plan: PatchPlan) -> Self {
        Self { artifact, plan }
    }

    pub fn from_options(options: &PatchOptions) -> Self {
        Self::new(ArtifactId::default(), PatchPlan::from_options(options))
    }

    pub fn artifact(&self) -> &ArtifactId {
        &self.artifact
    }

    pub fn plan(&self) -> &PatchPlan {
        &self.plan
    }

    /// Patch module text before bundling.
    ///
    /// Returns `None` when the module is not the loader or nothing is
    /// planned for this stage; otherwise the (possibly unchanged) text.
    pub fn pre_transform(&self, id: &str, code: &str) -> Option<String> {
        let request = self.plan.request(Stage::PreTransform);
        if request.is_empty()
            || !self
                .artifact
                .is_target(ArtifactHandle::Module { id }, OutputFormat::default())
        {
            return None;
        }

        let (code, report) = apply_request(request, id, code.to_string());
        debug!(
            "[fob-emscripten] {}: {} applied, {} failed in {}",
            Stage::PreTransform,
            report.applied.len(),
            report.failed.len(),
            id
        );
        Some(code)
    }

    /// Patch bundled chunks in place and record the output format for the
    /// disk stage
    pub fn post_bundle(
        &self,
        ctx: &mut BuildContext,
        format: OutputFormat,
        bundle: &mut [BundleEntry],
    ) -> StageReport {
        ctx.set_format(format);

        let request = self.plan.request(Stage::PostBundle);
        let mut report = StageReport::default();
        if request.is_empty() {
            return report;
        }

        for entry in bundle.iter_mut() {
            let BundleEntryKind::Chunk { code } = &mut entry.kind else {
                continue;
            };
            let handle = ArtifactHandle::Chunk {
                file_name: &entry.file_name,
                modules: &entry.modules,
            };
            if !self.artifact.is_target(handle, format) {
                continue;
            }

            let (patched, entry_report) =
                apply_request(request, &entry.file_name, std::mem::take(code));
            *code = patched;

            if entry_report.applied.contains(&PatchKind::WasmUrlPost) {
                ctx.mark_loader_post_patched();
            }
            report.merge(entry_report);
        }

        report
    }

    /// Whether the disk stage has work to do for this build
    pub fn needs_post_write(&self, ctx: &BuildContext) -> bool {
        self.plan
            .request(Stage::PostWrite)
            .contains(PatchKind::WasmUrlPost)
            && !ctx.loader_post_patched()
    }

    /// Re-open the emitted loader and apply the WASM URL post-patch.
    ///
    /// Only runs when the in-memory attempt could not happen, typically
    /// because the emitted file name does not carry the loader's module
    /// path. Errors are logged here and returned; the file is never rolled
    /// back.
    pub async fn post_write(&self, ctx: &BuildContext) -> Result<PostWriteOutcome, PostWriteError> {
        if !self.needs_post_write(ctx) {
            return Ok(PostWriteOutcome::Skipped);
        }

        let format = ctx.format().unwrap_or_else(|| {
            let assumed = OutputFormat::default();
            warn!(
                "[fob-emscripten] Output format was never resolved; assuming {}",
                assumed
            );
            assumed
        });
        let path = self.artifact.output_path(ctx.out_dir(), format);

        let result = patch_file(&path).await;
        match &result {
            Ok(_) => info!("[fob-emscripten] Post-patched {}", path.display()),
            Err(err) => error!("[fob-emscripten] Post-patch failed: {}", err),
        }
        result.map(|_| PostWriteOutcome::Patched { path })
    }
}

async fn patch_file(path: &std::path::Path) -> Result<(), PostWriteError> {
    let code = match tokio::fs::read_to_string(path).await {
        Ok(code) => code,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(PostWriteError::FileNotFound(path.to_path_buf()));
        }
        Err(err) => return Err(PostWriteError::io(path, err)),
    };

    let patched = PatchKind::WasmUrlPost.apply(&code).into_result()?;

    tokio::fs::write(path, patched)
        .await
        .map_err(|err| PostWriteError::io(path, err))
}

/// Run every transformation of `request` over `code`, continuing past
/// failures
fn apply_request(request: &PatchRequest, target: &str, mut code: String) -> (String, StageReport) {
    let mut report = StageReport::default();

    for &kind in &request.patches {
        let outcome = kind.apply(&code);
        match outcome.failure {
            None => {
                code = outcome.code;
                report.applied.push(kind);
            }
            Some(failure) => {
                if failure.is_already_applied() {
                    debug!("[fob-emscripten] {} skipped for {}: {}", kind, target, failure);
                } else {
                    warn!(
                        "[fob-emscripten] {} {} failed for {}: {}",
                        request.stage, kind, target, failure
                    );
                }
                report.failed.push(failure);
            }
        }
    }

    (code, report)
}

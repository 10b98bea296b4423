//! Patch command implementation.
//!
//! Runs the three stages the way a library build sees them: the loader
//! module is transformed in memory, emitted as `index.<format>.js`, and
//! post-patched on disk.

use crate::cli::PatchArgs;
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::ui;
use fob_plugin_emscripten::{
    ArtifactId, BuildContext, BundleEntry, LOADER_OUTPUT_STEM, OutputFormat, PatchPipeline,
    PatchPlan, PostWriteOutcome,
};

/// Execute the patch command.
///
/// # Errors
///
/// Returns errors when no patch is enabled, the loader cannot be read, the
/// output cannot be written, or the post-write stage fails.
pub async fn execute(args: PatchArgs) -> Result<()> {
    let config = utils::load_config(&args.config)?;
    let options = args.patches.apply_to(config.patch.unwrap_or_default());
    if options.is_empty() {
        return Err(CliError::InvalidArgument(
            "no patches enabled; pass --electron, --external-wasm or --hoist-worker, or add a [patch] section"
                .to_string(),
        ));
    }

    let code = utils::read_loader(&args.input).await?;
    let module_id = utils::module_id(&args.input);
    let format = OutputFormat::from(args.format);

    // The given file is the loader wherever it lives
    let pipeline = PatchPipeline::new(
        ArtifactId::new(module_id.clone(), LOADER_OUTPUT_STEM),
        PatchPlan::from_options(&options),
    );

    ui::info(&format!("Patching {}", args.input.display()));
    let transformed = pipeline.pre_transform(&module_id, &code).unwrap_or(code);

    // Library builds name the chunk after the output file, so the loader is
    // not recognised in memory and the post-patch happens on disk
    let file_name = pipeline.artifact().output_file_name(format);
    let mut bundle = vec![BundleEntry::chunk(file_name.clone(), transformed)];
    let mut ctx = BuildContext::new(&args.out_dir);
    pipeline.post_bundle(&mut ctx, format, &mut bundle);

    tokio::fs::create_dir_all(&args.out_dir).await?;
    let path = args.out_dir.join(&file_name);
    tokio::fs::write(&path, bundle[0].code().unwrap_or_default()).await?;

    match pipeline.post_write(&ctx).await? {
        PostWriteOutcome::Patched { path } => {
            ui::success(&format!("Wrote {} (post-patched)", path.display()));
        }
        PostWriteOutcome::Skipped => ui::success(&format!("Wrote {}", path.display())),
    }

    Ok(())
}

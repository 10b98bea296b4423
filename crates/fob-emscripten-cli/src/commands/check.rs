//! Check command implementation.
//!
//! Runs the pre-transform patches over a loader in memory and reports what
//! each one would do, without writing anything.

use crate::cli::CheckArgs;
use crate::commands::utils;
use crate::error::{CliError, Result};
use crate::ui;
use fob_plugin_emscripten::{ArtifactId, PatchOptions, PatchPlan, Stage};

/// Execute the check command.
///
/// Patches run in pipeline order, each on the previous one's output. A
/// patch that is already present counts as passing.
///
/// # Errors
///
/// Returns `CliError::PatchesFailed` if any patch would not apply.
pub async fn execute(args: CheckArgs) -> Result<()> {
    let options = if args.all {
        every_patch()
    } else {
        let config = utils::load_config(&args.config)?;
        let options = args.patches.apply_to(config.patch.unwrap_or_default());
        if options.is_empty() {
            ui::warning("No patches configured, checking all of them");
            every_patch()
        } else {
            options
        }
    };

    let mut code = utils::read_loader(&args.input).await?;

    if !ArtifactId::default().matches_module(&utils::module_id(&args.input)) {
        ui::warning(&format!(
            "{} is not at dist-wasm/index.js; a bundler build would leave it untouched",
            args.input.display()
        ));
    }

    ui::info(&format!("Checking {}", args.input.display()));

    let plan = PatchPlan::from_options(&options);
    let mut failed = 0;
    for kind in &plan.request(Stage::PreTransform).patches {
        let outcome = kind.apply(&code);
        match outcome.failure {
            None => {
                ui::success(&format!("{}: applies", kind));
                code = outcome.code;
            }
            Some(failure) if failure.is_already_applied() => {
                ui::info(&format!("{}: already applied", kind));
            }
            Some(failure) => {
                ui::error(&format!("{}: {}", kind, failure));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(CliError::PatchesFailed { count: failed });
    }

    ui::success("All patches apply");
    Ok(())
}

fn every_patch() -> PatchOptions {
    PatchOptions::new()
        .with_electron_support(true)
        .with_inline_wasm_disabled(true)
        .with_worker_hoisting(true)
}

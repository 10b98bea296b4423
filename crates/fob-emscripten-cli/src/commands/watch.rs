//! Watch command implementation.
//!
//! Feeds file events from the project root into a rebuild coordinator and
//! reports each rebuild's outcome until Ctrl+C.

use crate::cli::WatchArgs;
use crate::commands::utils;
use crate::error::Result;
use crate::ui;
use crate::watcher::FileWatcher;
use fob_plugin_emscripten::{
    HmrOptions, RebuildCoordinator, RebuildRunner, RebuildStatus, ShellRunner,
};
use std::sync::Arc;
use tokio::signal;

/// Execute the watch command.
///
/// # Process Flow
///
/// 1. Load `[hmr]` settings and apply command-line overrides
/// 2. Optionally run the build command once
/// 3. Start the file watcher
/// 4. Forward events to the coordinator and report rebuild status
/// 5. Stop on Ctrl+C, dropping any pending trigger
pub async fn execute(args: WatchArgs) -> Result<()> {
    let config = utils::load_config(&args.config)?;
    let mut hmr = config.hmr.unwrap_or_else(|| {
        ui::warning("No [hmr] section found, using defaults");
        HmrOptions::default()
    });
    if let Some(command) = args.command {
        hmr.command = command;
    }
    if let Some(debounce) = args.debounce {
        hmr.debounce_ms = debounce;
    }

    let root = args.config.root;
    let runner = Arc::new(ShellRunner::new().with_cwd(&root));

    if args.initial {
        ui::info(&format!("Running {}", hmr.command));
        match runner.run(&hmr.command).await {
            Ok(()) => ui::success("Initial build completed"),
            Err(e) => ui::error(&format!("Initial build failed: {}", e)),
        }
    }

    let dirs: Vec<String> = hmr
        .watch_dirs
        .iter()
        .map(|dir| dir.display().to_string())
        .collect();
    let coordinator = RebuildCoordinator::new(hmr, runner);
    let mut status = coordinator.subscribe();

    let (watcher, mut change_rx) = FileWatcher::new(root)?;
    ui::info(&format!(
        "Watching {} in {}",
        dirs.join(", "),
        watcher.root().display()
    ));
    ui::info("Press Ctrl+C to stop");

    loop {
        tokio::select! {
            Some(event) = change_rx.recv() => {
                coordinator.handle_event(event);
            }

            Ok(()) = status.changed() => {
                let current = status.borrow_and_update().clone();
                report(&current);
            }

            _ = signal::ctrl_c() => {
                ui::info("Stopping watcher...");
                break;
            }
        }
    }

    coordinator.cancel_pending();
    ui::success("Watcher stopped");
    Ok(())
}

fn report(status: &RebuildStatus) {
    match status {
        RebuildStatus::NotStarted => {}
        RebuildStatus::InProgress => ui::info("Rebuilding..."),
        RebuildStatus::Succeeded { duration_ms } => {
            ui::success(&format!("Rebuild completed in {}ms", duration_ms));
        }
        RebuildStatus::Failed { error } => ui::error(&format!("Rebuild failed: {}", error)),
    }
}

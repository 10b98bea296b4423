//! Integration tests for native rebuilds driven through the plugin and the
//! real shell runner.

#![cfg(unix)]

use fob_plugin_emscripten::{
    BuildMode, EmscriptenConfig, EmscriptenPlugin, HmrOptions, RebuildCoordinator, RebuildRunner,
    RebuildStatus, ShellRunner,
};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::watch;

async fn wait_for_outcome(status: &mut watch::Receiver<RebuildStatus>) -> RebuildStatus {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            status.changed().await.unwrap();
            let current = status.borrow_and_update().clone();
            if !current.is_in_progress() {
                return current;
            }
        }
    })
    .await
    .expect("rebuild did not finish in time")
}

fn hmr(command: &str) -> HmrOptions {
    HmrOptions::new()
        .with_watch_dirs(["native"])
        .with_debounce_ms(20)
        .with_command(command)
}

#[tokio::test]
async fn test_shell_runner_reports_exit_code_and_stderr() {
    let err = ShellRunner::new()
        .run("echo 'undefined symbol: main' >&2; exit 3")
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "`echo 'undefined symbol: main' >&2; exit 3` exited with code 3"
    );
    match err {
        fob_plugin_emscripten::RebuildError::Exit { code, stderr, .. } => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "undefined symbol: main");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_shell_runner_uses_cwd() {
    let temp = TempDir::new().unwrap();
    ShellRunner::new()
        .with_cwd(temp.path())
        .run("touch built.marker")
        .await
        .unwrap();
    assert!(temp.path().join("built.marker").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_file_change_runs_command() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("rebuilt");
    let command = format!("touch '{}'", marker.display());

    let config = EmscriptenConfig::new().with_hmr(hmr(&command));
    let plugin = EmscriptenPlugin::from_config(config, BuildMode::Serve);
    let rebuilds = plugin.rebuilds().unwrap();
    let mut status = rebuilds.subscribe();

    assert!(plugin.handle_file_change(temp.path().join("native/lib.c")));

    let outcome = wait_for_outcome(&mut status).await;
    assert!(outcome.is_success(), "{outcome:?}");
    assert!(marker.exists());
    assert_eq!(rebuilds.rebuild_count(), 1);
    assert!(!rebuilds.is_building());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_command_is_reported_and_recovers() {
    let coordinator = RebuildCoordinator::with_shell(hmr("exit 1"));
    let mut status = coordinator.subscribe();

    coordinator.handle_event(fob_plugin_emscripten::WatchedFileEvent::new("native/a.c"));
    let outcome = wait_for_outcome(&mut status).await;
    assert!(outcome.error().unwrap().contains("exited with code 1"));
    assert!(!coordinator.is_building());

    coordinator.handle_event(fob_plugin_emscripten::WatchedFileEvent::new("native/a.c"));
    wait_for_outcome(&mut status).await;
    assert_eq!(coordinator.rebuild_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_object_files_never_trigger() {
    let config = EmscriptenConfig::new().with_hmr(hmr("true"));
    let plugin = EmscriptenPlugin::from_config(config, BuildMode::Serve);

    assert!(!plugin.handle_file_change("native/lib.o"));
    assert!(!plugin.handle_file_change("src/app.ts"));

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(plugin.rebuilds().unwrap().rebuild_count(), 0);
}

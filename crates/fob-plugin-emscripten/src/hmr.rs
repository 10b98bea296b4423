//! Debounced, single-flight rebuilds of the native sources
//!
//! The coordinator sits between a stream of file-change events and an
//! external build command:
//!
//! ```text
//!            qualifying event              timer elapsed, not in flight
//!   Idle ──────────────────────► Debouncing ───────────────────────────► Building
//!    ▲                            │  ▲    │                                 │
//!    │                            └──┘    │ timer elapsed, in flight        │
//!    │                    event: restart  │ (trigger dropped)               │
//!    └────────────────────────────────────┴─────────────────────────────────┘
//!                                           command finished (ok or not)
//! ```
//!
//! The pending timer and the running build are separate tasks, so
//! restarting the debounce never cancels a build that is already running.

use crate::config::HmrOptions;
use crate::error::RebuildError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info};

/// A file-change notification from whatever is watching the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFileEvent {
    pub path: PathBuf,
}

impl WatchedFileEvent {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Where the coordinator is in its cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildState {
    Idle,
    Debouncing,
    Building,
}

/// Outcome of the most recent rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RebuildStatus {
    /// No rebuild has been started yet
    NotStarted,
    /// The command is running
    InProgress,
    /// The command exited successfully
    Succeeded { duration_ms: u64 },
    /// The command could not be spawned or exited unsuccessfully
    Failed { error: String },
}

impl RebuildStatus {
    pub fn is_in_progress(&self) -> bool {
        matches!(self, RebuildStatus::InProgress)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RebuildStatus::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RebuildStatus::Failed { error } => Some(error),
            _ => None,
        }
    }
}

/// Runs the rebuild command
#[async_trait]
pub trait RebuildRunner: Send + Sync {
    async fn run(&self, command: &str) -> Result<(), RebuildError>;
}

/// Runs the command through the platform shell
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    cwd: Option<PathBuf>,
}

impl ShellRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run commands from `cwd` instead of the current directory
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    fn command(&self, command: &str) -> tokio::process::Command {
        #[cfg(windows)]
        let mut cmd = {
            let mut cmd = tokio::process::Command::new("cmd");
            cmd.arg("/C").arg(command);
            cmd
        };
        #[cfg(not(windows))]
        let mut cmd = {
            let mut cmd = tokio::process::Command::new("sh");
            cmd.arg("-c").arg(command);
            cmd
        };

        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        cmd.stdin(std::process::Stdio::null());
        cmd
    }
}

#[async_trait]
impl RebuildRunner for ShellRunner {
    async fn run(&self, command: &str) -> Result<(), RebuildError> {
        let output = self
            .command(command)
            .output()
            .await
            .map_err(|err| RebuildError::spawn(command, err))?;

        for line in String::from_utf8_lossy(&output.stdout).lines() {
            debug!("[fob-emscripten] {}", line);
        }

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            Err(RebuildError::exit(command, output.status.code(), stderr))
        }
    }
}

/// Debounces file events into at most one concurrent rebuild
#[derive(Clone)]
pub struct RebuildCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    options: HmrOptions,
    runner: Arc<dyn RebuildRunner>,
    in_flight: AtomicBool,
    /// Pending debounce timer, tagged with the generation that armed it
    pending: Mutex<Option<(u64, JoinHandle<()>)>>,
    generation: AtomicU64,
    rebuilds: AtomicUsize,
    status: watch::Sender<RebuildStatus>,
}

impl std::fmt::Debug for RebuildCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildCoordinator")
            .field("options", &self.inner.options)
            .field("state", &self.state())
            .finish()
    }
}

impl RebuildCoordinator {
    pub fn new(options: HmrOptions, runner: Arc<dyn RebuildRunner>) -> Self {
        let (status, _) = watch::channel(RebuildStatus::NotStarted);
        Self {
            inner: Arc::new(Inner {
                options,
                runner,
                in_flight: AtomicBool::new(false),
                pending: Mutex::new(None),
                generation: AtomicU64::new(0),
                rebuilds: AtomicUsize::new(0),
                status,
            }),
        }
    }

    /// Coordinator that runs the configured command through the shell
    pub fn with_shell(options: HmrOptions) -> Self {
        Self::new(options, Arc::new(ShellRunner::new()))
    }

    pub fn options(&self) -> &HmrOptions {
        &self.inner.options
    }

    /// Whether a change to `path` should trigger a rebuild
    pub fn is_relevant(&self, path: &Path) -> bool {
        let options = &self.inner.options;
        let watched = options
            .watch_dirs
            .iter()
            .any(|root| is_under_watch_root(path, root));
        if !watched {
            return false;
        }

        let name = path.to_string_lossy();
        !options.ignore_exts.iter().any(|ext| name.ends_with(ext.as_str()))
    }

    /// Feed one file event.
    ///
    /// Returns whether the event (re)started the debounce timer. Irrelevant
    /// events leave the coordinator untouched, including any pending timer.
    /// Must be called from within a tokio runtime.
    pub fn handle_event(&self, event: WatchedFileEvent) -> bool {
        if !self.is_relevant(&event.path) {
            return false;
        }

        debug!("[fob-emscripten] Change detected: {}", event.path.display());

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut pending = self.inner.pending.lock();
        if let Some((_, timer)) = pending.take() {
            timer.abort();
        }

        let inner = Arc::clone(&self.inner);
        let delay = self.inner.options.debounce();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut pending = inner.pending.lock();
                match pending.as_ref() {
                    Some((armed, _)) if *armed == generation => {
                        pending.take();
                    }
                    // Superseded between waking and taking the lock
                    _ => return,
                }
            }
            Inner::fire(&inner);
        });
        *pending = Some((generation, timer));

        true
    }

    /// Current position in the cycle
    pub fn state(&self) -> RebuildState {
        if self.is_building() {
            RebuildState::Building
        } else if self
            .inner
            .pending
            .lock()
            .as_ref()
            .is_some_and(|(_, timer)| !timer.is_finished())
        {
            RebuildState::Debouncing
        } else {
            RebuildState::Idle
        }
    }

    pub fn is_building(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Watch the outcome of rebuilds as they happen
    pub fn subscribe(&self) -> watch::Receiver<RebuildStatus> {
        self.inner.status.subscribe()
    }

    /// Latest rebuild outcome
    pub fn status(&self) -> RebuildStatus {
        self.inner.status.borrow().clone()
    }

    /// Number of rebuilds started so far
    pub fn rebuild_count(&self) -> usize {
        self.inner.rebuilds.load(Ordering::SeqCst)
    }

    /// Drop any pending trigger. A running rebuild is left to finish.
    pub fn cancel_pending(&self) {
        if let Some((_, timer)) = self.inner.pending.lock().take() {
            timer.abort();
        }
    }
}

impl Inner {
    fn fire(inner: &Arc<Inner>) {
        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("[fob-emscripten] Rebuild already running, dropping trigger");
            return;
        }

        inner.rebuilds.fetch_add(1, Ordering::SeqCst);
        inner.status.send_replace(RebuildStatus::InProgress);
        info!("[fob-emscripten] Rebuilding...");

        let inner = Arc::clone(inner);
        tokio::spawn(async move {
            let started = Instant::now();
            let result = inner.runner.run(&inner.options.command).await;

            let status = match result {
                Ok(()) => {
                    let duration_ms = started.elapsed().as_millis() as u64;
                    info!("[fob-emscripten] Rebuild finished in {}ms", duration_ms);
                    RebuildStatus::Succeeded { duration_ms }
                }
                Err(err) => {
                    error!("[fob-emscripten] Rebuild failed: {}", err);
                    if let RebuildError::Exit { stderr, .. } = &err {
                        if !stderr.is_empty() {
                            error!("[fob-emscripten] {}", stderr);
                        }
                    }
                    RebuildStatus::Failed {
                        error: err.to_string(),
                    }
                }
            };

            inner.in_flight.store(false, Ordering::SeqCst);
            inner.status.send_replace(status);
        });
    }
}

/// Relative roots match as a run of path components anywhere in `path`;
/// absolute roots match as a prefix
fn is_under_watch_root(path: &Path, root: &Path) -> bool {
    if root.is_absolute() {
        return path.starts_with(root);
    }

    let root: Vec<_> = root
        .components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect();
    if root.is_empty() {
        return false;
    }
    let path: Vec<_> = path.components().collect();
    path.windows(root.len()).any(|window| window == root.as_slice())
}

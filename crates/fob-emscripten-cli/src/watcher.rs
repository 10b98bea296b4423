//! File system event source for native rebuilds.
//!
//! Watches the project root recursively and forwards changed paths as
//! [`WatchedFileEvent`]s. Which of them trigger a rebuild, and when, is
//! decided by the rebuild coordinator; this layer only drops events that
//! are outside the root, hidden, or not a create/modify/remove.

use crate::error::{CliError, Result};
use fob_plugin_emscripten::WatchedFileEvent;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Recursive watcher feeding a channel of file events.
pub struct FileWatcher {
    /// Kept alive for as long as events are wanted
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` doesn't exist or the platform watcher
    /// cannot be created.
    pub fn new(root: PathBuf) -> Result<(Self, mpsc::Receiver<WatchedFileEvent>)> {
        if !root.exists() {
            return Err(CliError::FileNotFound(root));
        }
        // Events arrive with absolute paths
        let root = root.canonicalize()?;

        let (tx, rx) = mpsc::channel(100);
        let root_clone = root.clone();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else {
                return;
            };
            if !matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                return;
            }

            for path in event.paths {
                if Self::should_ignore(&path, &root_clone) {
                    continue;
                }
                // Receiver gone means the command is shutting down
                if tx.blocking_send(WatchedFileEvent::new(path)).is_err() {
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    /// Paths outside the root and hidden files or directories are ignored.
    fn should_ignore(path: &Path, root: &Path) -> bool {
        let Ok(rel_path) = path.strip_prefix(root) else {
            return true;
        };

        rel_path.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
        })
    }

    /// Get the root directory being watched.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_ignore_hidden_files() {
        let root = PathBuf::from("/project");

        assert!(FileWatcher::should_ignore(
            Path::new("/project/.git/index"),
            &root
        ));
        assert!(FileWatcher::should_ignore(
            Path::new("/project/src-wasm/.lib.c.swp"),
            &root
        ));
        assert!(!FileWatcher::should_ignore(
            Path::new("/project/src-wasm/lib.c"),
            &root
        ));
    }

    #[test]
    fn test_should_ignore_outside_root() {
        let root = PathBuf::from("/project");
        assert!(FileWatcher::should_ignore(Path::new("/other/lib.c"), &root));
    }

    #[test]
    fn test_missing_root() {
        let result = FileWatcher::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(result, Err(CliError::FileNotFound(_))));
    }
}

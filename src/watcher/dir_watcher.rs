//! Recursive directory watcher with notify integration.
//!
//! Watches a root directory and every directory created beneath it, and
//! forwards [`RawEvent`]s to a tokio channel.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatcherError;
use super::event::{classify, RawEvent};

/// Watches a directory tree for created and write-closed files.
///
/// Dropping the watcher (or calling [`DirWatcher::stop`]) unsubscribes from
/// the backend, after which the event receiver drains and returns `None`.
pub struct DirWatcher {
    /// The root being watched.
    root: PathBuf,
    /// Backend handle; events stop when it is dropped.
    inner: RecommendedWatcher,
}

impl DirWatcher {
    /// Start watching `root` recursively.
    ///
    /// Returns the watcher and a receiver for normalized events.
    ///
    /// # Errors
    ///
    /// Returns [`WatcherError::Inaccessible`] if `root` cannot be read,
    /// [`WatcherError::NotADirectory`] if it is a file, and
    /// [`WatcherError::Backend`] if notify refuses to watch it.
    pub fn new(root: PathBuf) -> Result<(Self, mpsc::UnboundedReceiver<RawEvent>), WatcherError> {
        let metadata = match std::fs::metadata(&root) {
            Ok(metadata) => metadata,
            Err(source) => return Err(WatcherError::Inaccessible { path: root, source }),
        };
        if !metadata.is_dir() {
            return Err(WatcherError::NotADirectory { path: root });
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let inner = notify::recommended_watcher(move |result: notify::Result<notify::Event>| {
            match result {
                Ok(event) => {
                    for raw in classify(&event) {
                        // Receiver gone means the daemon is shutting down.
                        let _ = event_tx.send(raw);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "File watcher reported an error");
                }
            }
        });
        let mut inner = match inner {
            Ok(inner) => inner,
            Err(source) => return Err(WatcherError::Backend { path: root, source }),
        };

        if let Err(source) = inner.watch(&root, RecursiveMode::Recursive) {
            return Err(WatcherError::Backend { path: root, source });
        }

        tracing::info!(root = %root.display(), "Watching directory tree");

        Ok((Self { root, inner }, event_rx))
    }

    /// Get the root being watched.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Stop watching. Pending events already queued remain readable.
    pub fn stop(mut self) {
        if let Err(e) = self.inner.unwatch(&self.root) {
            tracing::debug!(error = %e, "Unwatch failed during stop");
        }
        tracing::info!(root = %self.root.display(), "Stopped watching");
    }
}

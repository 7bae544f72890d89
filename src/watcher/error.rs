//! Watcher error types.

use std::path::{Path, PathBuf};

/// Errors that prevent a directory watch from starting.
#[derive(thiserror::Error, Debug)]
pub enum WatcherError {
    /// Watch root is missing or cannot be read.
    #[error("Cannot watch {path}: {source}")]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Watch root exists but is not a directory.
    #[error("Cannot watch {path}: not a directory")]
    NotADirectory { path: PathBuf },

    /// The notify backend refused to create or register the watch.
    #[error("Cannot watch {path}: {source}")]
    Backend {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}

impl WatcherError {
    /// The watch root this error is about.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Inaccessible { path, .. }
            | Self::NotADirectory { path }
            | Self::Backend { path, .. } => path,
        }
    }
}

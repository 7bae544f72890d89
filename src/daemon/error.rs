//! Daemon error types.

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::watcher::WatcherError;

/// Errors that end a lifecycle action.
#[derive(thiserror::Error, Debug)]
pub enum DaemonError {
    /// Configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The watch could not be set up.
    #[error(transparent)]
    Watch(#[from] WatcherError),

    /// Another instance owns the pid file.
    #[error("Already running with pid {pid} ({path})")]
    AlreadyRunning { pid: u32, path: PathBuf },

    /// The pid file could not be read or written.
    #[error("Pid file {path}: {source}")]
    PidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The pid file does not hold a pid.
    #[error("Pid file {path} does not contain a pid")]
    InvalidPidFile { path: PathBuf },

    /// Signalling the running instance failed.
    #[error("Failed to signal pid {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    /// The running instance did not exit in time.
    #[error("Pid {pid} did not exit within {secs}s")]
    StopTimeout { pid: u32, secs: u64 },

    /// Installing signal handlers failed.
    #[error("Failed to install signal handler: {0}")]
    SignalHandler(#[source] std::io::Error),
}

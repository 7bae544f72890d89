//! Start, stop and restart.

use std::path::Path;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::config::DaemonConfig;
use crate::pipeline::PipelineStats;

use super::pidfile::{process_alive, read_pid, PidFile};
use super::{serve, DaemonError};

/// Default time to wait for a running instance to exit.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// How often `stop` checks whether the instance has exited.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Lifecycle action requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    Stop,
    Restart,
}

/// What `stop` found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The instance exited after SIGTERM.
    Stopped { pid: u32 },
    /// No pid file.
    NotRunning,
    /// The pid file named a dead process and was removed.
    StaleRemoved { pid: u32 },
}

/// Run in the foreground until SIGTERM or SIGINT.
///
/// # Errors
///
/// Returns an error if another instance is running, the pid file cannot be
/// written, signal handlers cannot be installed, or the watch cannot be set
/// up.
pub async fn start(config: &DaemonConfig) -> Result<PipelineStats, DaemonError> {
    let pid_file = PidFile::acquire(&config.pid_file)?;
    let cancel = CancellationToken::new();
    spawn_signal_listener(cancel.clone())?;

    let result = serve(config, cancel).await;
    drop(pid_file);
    result
}

/// Ask the instance recorded in `pid_file` to stop and wait for it.
///
/// # Errors
///
/// Returns an error if the pid file is unreadable, the signal cannot be
/// sent, or the process outlives `timeout`.
pub async fn stop(pid_file: &Path, timeout: Duration) -> Result<StopOutcome, DaemonError> {
    let Some(pid) = read_pid(pid_file)? else {
        tracing::info!(path = %pid_file.display(), "No pid file, not running");
        return Ok(StopOutcome::NotRunning);
    };

    if !process_alive(pid) {
        remove_stale(pid_file, pid)?;
        return Ok(StopOutcome::StaleRemoved { pid });
    }

    terminate(pid)?;
    tracing::info!(pid, "Sent SIGTERM");

    let deadline = Instant::now() + timeout;
    while process_alive(pid) {
        if Instant::now() >= deadline {
            return Err(DaemonError::StopTimeout {
                pid,
                secs: timeout.as_secs(),
            });
        }
        tokio::time::sleep(STOP_POLL_INTERVAL).await;
    }

    // The instance removes its own pid file; clean up if it was killed.
    if read_pid(pid_file).ok().flatten() == Some(pid) {
        remove_stale(pid_file, pid)?;
    }

    Ok(StopOutcome::Stopped { pid })
}

fn remove_stale(pid_file: &Path, pid: u32) -> Result<(), DaemonError> {
    tracing::warn!(pid, path = %pid_file.display(), "Removing stale pid file");
    match std::fs::remove_file(pid_file) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DaemonError::PidFile {
            path: pid_file.to_path_buf(),
            source,
        }),
    }
}

#[cfg(unix)]
fn terminate(pid: u32) -> Result<(), DaemonError> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let raw = i32::try_from(pid).map_err(|_| DaemonError::Signal {
        pid,
        reason: "pid out of range".to_string(),
    })?;
    kill(Pid::from_raw(raw), Signal::SIGTERM).map_err(|e| DaemonError::Signal {
        pid,
        reason: e.to_string(),
    })
}

#[cfg(not(unix))]
fn terminate(pid: u32) -> Result<(), DaemonError> {
    Err(DaemonError::Signal {
        pid,
        reason: "signals are not supported on this platform".to_string(),
    })
}

/// Cancel `cancel` on SIGTERM or Ctrl-C.
fn spawn_signal_listener(cancel: CancellationToken) -> Result<(), DaemonError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = signal(SignalKind::terminate()).map_err(DaemonError::SignalHandler)?;
        tokio::spawn(async move {
            tokio::select! {
                _ = term.recv() => tracing::info!("Received SIGTERM"),
                _ = tokio::signal::ctrl_c() => tracing::info!("Received interrupt"),
            }
            cancel.cancel();
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received interrupt");
            }
            cancel.cancel();
        });
    }

    Ok(())
}

//! Pid file handling.

use std::path::{Path, PathBuf};

use super::DaemonError;

/// A pid file owned by this process. Removed on drop.
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Record this process in `path`.
    ///
    /// A pid file left by a process that no longer exists is replaced.
    ///
    /// # Errors
    ///
    /// Returns [`DaemonError::AlreadyRunning`] if a live process owns the
    /// file, or an I/O error if it cannot be written.
    pub fn acquire(path: &Path) -> Result<Self, DaemonError> {
        let own = std::process::id();
        match read_pid(path) {
            Ok(Some(pid)) if pid != own && process_alive(pid) => {
                return Err(DaemonError::AlreadyRunning {
                    pid,
                    path: path.to_path_buf(),
                });
            }
            Ok(Some(pid)) => {
                tracing::warn!(pid, path = %path.display(), "Replacing stale pid file");
            }
            Ok(None) => {}
            Err(DaemonError::InvalidPidFile { .. }) => {
                tracing::warn!(path = %path.display(), "Replacing unreadable pid file");
            }
            Err(e) => return Err(e),
        }

        std::fs::write(path, format!("{own}\n")).map_err(|source| DaemonError::PidFile {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(pid = own, path = %path.display(), "Wrote pid file");

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Get the pid file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        // Only remove the file if it still names us; a restart may have
        // replaced it already.
        if matches!(read_pid(&self.path), Ok(Some(pid)) if pid == std::process::id()) {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to remove pid file");
            }
        }
    }
}

/// Read the pid stored in `path`, `None` if the file does not exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn read_pid(path: &Path) -> Result<Option<u32>, DaemonError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(DaemonError::PidFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    content
        .trim()
        .parse::<u32>()
        .map(Some)
        .map_err(|_| DaemonError::InvalidPidFile {
            path: path.to_path_buf(),
        })
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
#[must_use]
pub fn process_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return false;
    };
    match kill(Pid::from_raw(raw), None) {
        Ok(()) | Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

/// Whether a process with `pid` exists.
#[cfg(not(unix))]
#[must_use]
pub fn process_alive(_pid: u32) -> bool {
    false
}

//! Daemon lifecycle: pid file, signals, and the watch service.

mod error;
mod lifecycle;
mod pidfile;
mod service;

pub use error::DaemonError;
pub use lifecycle::{start, stop, Action, StopOutcome, DEFAULT_STOP_TIMEOUT};
pub use pidfile::{process_alive, read_pid, PidFile};
pub use service::{build_runner, serve};

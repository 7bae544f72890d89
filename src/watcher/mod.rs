//! Directory watching.
//!
//! Adapts the platform notification backend to the two events the
//! conversion pipeline cares about.

mod dir_watcher;
mod error;
mod event;

pub use dir_watcher::DirWatcher;
pub use error::WatcherError;
pub use event::{classify, RawEvent};

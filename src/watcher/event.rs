//! Normalized filesystem events.

use std::path::{Path, PathBuf};

use notify::event::{AccessKind, AccessMode, CreateKind, EventKind};

/// The two filesystem events the pipeline consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    /// A new filesystem entry now exists at this path.
    Created(PathBuf),
    /// A file that was opened for writing has been closed.
    ClosedAfterWrite(PathBuf),
}

impl RawEvent {
    /// The path this event refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(path) | Self::ClosedAfterWrite(path) => path,
        }
    }
}

/// Reduce a notify event to zero or more [`RawEvent`]s.
///
/// Directory creation, modification, removal and read-only closes are
/// dropped.
#[must_use]
pub fn classify(event: &notify::Event) -> Vec<RawEvent> {
    let make: fn(PathBuf) -> RawEvent = match event.kind {
        EventKind::Create(CreateKind::Folder) => return Vec::new(),
        EventKind::Create(_) => RawEvent::Created,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => RawEvent::ClosedAfterWrite,
        _ => return Vec::new(),
    };

    event.paths.iter().cloned().map(make).collect()
}

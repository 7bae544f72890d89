//! Files created but not yet closed after writing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Set of paths awaiting their close-after-write event.
///
/// Owned by a single [`EventCorrelator`](super::EventCorrelator); not shared.
#[derive(Debug, Default)]
pub struct PendingSet {
    paths: HashSet<PathBuf>,
}

impl PendingSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path`. Returns `false` if it was already tracked.
    pub fn add(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }

    /// Stop tracking `path`. Returns whether it was tracked.
    pub fn remove_if_present(&mut self, path: &Path) -> bool {
        self.paths.remove(path)
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

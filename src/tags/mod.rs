//! Tag transfer between audio files.
//!
//! Two backends implement [`TagTransferor`]: [`LoftyTagTransferor`] copies
//! tags in-process, [`CommandTagTransferor`] delegates to an external
//! utility.

mod builtin;
mod command;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use builtin::LoftyTagTransferor;
pub use command::{CommandTagTransferor, FROM_PLACEHOLDER, TO_PLACEHOLDER};

/// Errors from a single tag transfer.
#[derive(thiserror::Error, Debug)]
pub enum TagError {
    /// The source could not be read.
    #[error("Failed to read tags from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    /// The destination could not be written.
    #[error("Failed to write tags to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },

    /// The destination format cannot hold the tags.
    #[error("{path} cannot hold {tag_type} tags")]
    Unsupported { path: PathBuf, tag_type: String },

    /// The external tag utility exited unsuccessfully.
    #[error(
        "Tag utility {program} exited with {}",
        .code.map_or_else(|| "signal".to_string(), |c| c.to_string())
    )]
    CommandFailed { program: String, code: Option<i32> },

    /// The external tag utility could not be started.
    #[error("Failed to run tag utility {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Blocking task was cancelled.
    #[error("Blocking task cancelled")]
    TaskCancelled,
}

impl TagError {
    /// Whether the failure is "destination cannot hold tags".
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// Successful outcome of one tag transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTransferOutcome {
    /// Tags were written to the destination.
    Transferred {
        /// Number of tag items written, when known.
        items: Option<usize>,
    },
    /// The source carried no tags; the destination was left alone.
    NothingToTransfer,
}

/// Copies tags from one file onto another.
#[async_trait]
pub trait TagTransferor: Send + Sync {
    /// Copy every transferable tag field from `from` onto `to`.
    ///
    /// `from` and `to` may be the same path; this rewrites the tags in
    /// canonical form.
    async fn transfer(&self, from: &Path, to: &Path) -> Result<TagTransferOutcome, TagError>;
}

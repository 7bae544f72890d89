//! In-process tag transfer using lofty.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lofty::error::{ErrorKind, LoftyError};
use lofty::{Probe, Tag, TagExt, TagType, TaggedFileExt};

use super::{TagError, TagTransferOutcome, TagTransferor};

/// Copies tags with `lofty`, remapping them to the destination's native tag
/// type.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoftyTagTransferor;

impl LoftyTagTransferor {
    /// Create a new transferor.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Blocking transfer; run off the async runtime.
    fn transfer_blocking(from: &Path, to: &Path) -> Result<TagTransferOutcome, TagError> {
        let Some(mut tag) = read_tag(from)? else {
            tracing::debug!(path = %from.display(), "Source has no tags");
            return Ok(TagTransferOutcome::NothingToTransfer);
        };

        let unsupported = |tag_type: TagType| TagError::Unsupported {
            path: to.to_path_buf(),
            tag_type: format!("{tag_type:?}"),
        };

        let destination = match Probe::open(to).and_then(Probe::read) {
            Ok(destination) => destination,
            Err(e) if is_untaggable(&e) => return Err(unsupported(tag.tag_type())),
            Err(source) => {
                return Err(TagError::Read {
                    path: to.to_path_buf(),
                    source,
                })
            }
        };

        let tag_type = destination.primary_tag_type();
        if tag.tag_type() != tag_type {
            tag.re_map(tag_type);
        }
        let items = tag.len();

        match tag.save_to_path(to) {
            Ok(()) => Ok(TagTransferOutcome::Transferred { items: Some(items) }),
            Err(e) if is_untaggable(&e) => Err(unsupported(tag_type)),
            Err(source) => Err(TagError::Write {
                path: to.to_path_buf(),
                source,
            }),
        }
    }
}

/// Whether lofty rejected the file as one it cannot hold tags for.
fn is_untaggable(err: &LoftyError) -> bool {
    matches!(
        err.kind(),
        ErrorKind::UnknownFormat | ErrorKind::UnsupportedTag
    )
}

/// Read the primary tag of `path`, falling back to the first tag present.
fn read_tag(path: &Path) -> Result<Option<Tag>, TagError> {
    let read_error = |source| TagError::Read {
        path: PathBuf::from(path),
        source,
    };

    let tagged_file = Probe::open(path)
        .map_err(read_error)?
        .read()
        .map_err(read_error)?;

    Ok(tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag())
        .filter(|tag| !tag.is_empty())
        .cloned())
}

#[async_trait]
impl TagTransferor for LoftyTagTransferor {
    async fn transfer(&self, from: &Path, to: &Path) -> Result<TagTransferOutcome, TagError> {
        let from = from.to_path_buf();
        let to = to.to_path_buf();

        match tokio::task::spawn_blocking(move || Self::transfer_blocking(&from, &to)).await {
            Ok(result) => result,
            // Let panics reach the pipeline's failure boundary.
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(_) => Err(TagError::TaskCancelled),
        }
    }
}

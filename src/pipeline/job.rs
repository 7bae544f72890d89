//! Conversion jobs and their reports.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::tags::TagTransferOutcome;

use super::PipelineError;

/// One file to convert.
///
/// Built when a pending file is closed after writing; never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    pub target_path: PathBuf,
}

impl ConversionJob {
    /// Job for `source_path`, targeting the same path with
    /// `target_extension`.
    #[must_use]
    pub fn new(source_path: PathBuf, target_extension: &str) -> Self {
        let target_path = source_path.with_extension(target_extension);
        Self {
            source_path,
            target_path,
        }
    }
}

/// Whether `path` ends in `.{extension}`, ignoring ASCII case.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// The two tag transfers run after a successful conversion, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStep {
    /// Source onto itself, normalizing its tags.
    SelfTransfer,
    /// Source onto the converted file.
    CrossTransfer,
}

impl fmt::Display for TagStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfTransfer => write!(f, "self"),
            Self::CrossTransfer => write!(f, "cross"),
        }
    }
}

/// Result of one tag step.
#[derive(Debug)]
pub struct TagStepReport {
    pub step: TagStep,
    pub result: Result<TagTransferOutcome, PipelineError>,
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// The converter succeeded; tag steps ran in order.
    Converted { tag_steps: Vec<TagStepReport> },
    /// The job stopped early.
    Failed(PipelineError),
}

impl JobOutcome {
    /// Number of tag steps that failed.
    #[must_use]
    pub fn tag_failures(&self) -> usize {
        match self {
            Self::Converted { tag_steps } => {
                tag_steps.iter().filter(|s| s.result.is_err()).count()
            }
            Self::Failed(_) => 0,
        }
    }

    #[must_use]
    pub fn is_converted(&self) -> bool {
        matches!(self, Self::Converted { .. })
    }
}

/// Report sent back from a finished job.
#[derive(Debug)]
pub struct JobReport {
    pub job: ConversionJob,
    pub outcome: JobOutcome,
    pub elapsed: Duration,
}

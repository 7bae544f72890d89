//! The conversion pipeline.
//!
//! Turns a stream of [`RawEvent`](crate::watcher::RawEvent)s into exactly one
//! conversion per completed file, isolating failures per file.

mod correlator;
mod error;
mod job;
mod pending;
mod runner;
mod stats;

pub use correlator::{EventCorrelator, EventOutcome};
pub use error::PipelineError;
pub use job::{
    has_extension, ConversionJob, JobOutcome, JobReport, TagStep, TagStepReport,
};
pub use pending::PendingSet;
pub use runner::JobRunner;
pub use stats::PipelineStats;

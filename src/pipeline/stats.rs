//! Pipeline counters.

use super::{JobOutcome, JobReport};

/// Counters across the lifetime of one event loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Events read from the watcher.
    pub events: usize,
    /// Created events for files without the source extension.
    pub ignored: usize,
    /// Files that entered the pending set.
    pub tracked: usize,
    /// Close events for paths that were not pending.
    pub unmatched: usize,
    /// Files converted successfully.
    pub converted: usize,
    /// Conversions that failed or could not run.
    pub conversion_failures: usize,
    /// Individual tag transfers that failed.
    pub tag_failures: usize,
    /// Unexpected faults caught at the failure boundary.
    pub faults: usize,
}

impl PipelineStats {
    /// Add the result of a finished job.
    pub fn record(&mut self, report: &JobReport) {
        match &report.outcome {
            JobOutcome::Converted { .. } => {
                self.converted = self.converted.saturating_add(1);
                self.tag_failures = self
                    .tag_failures
                    .saturating_add(report.outcome.tag_failures());
            }
            JobOutcome::Failed(err) if err.is_conversion_failure() => {
                self.conversion_failures = self.conversion_failures.saturating_add(1);
            }
            // Anything else that ends a job early is a fault.
            JobOutcome::Failed(_) => {
                self.faults = self.faults.saturating_add(1);
            }
        }
    }

    /// Jobs that have reported back.
    #[must_use]
    pub fn finished(&self) -> usize {
        self.converted + self.conversion_failures + self.faults
    }
}

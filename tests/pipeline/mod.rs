//! Pipeline tests.

mod concurrent_test;
mod correlator_test;
mod mocks;

/// Verify the public pipeline types are exported from the library.
#[test]
fn test_all_pipeline_types_exported() {
    use convertd::pipeline::{
        ConversionJob, EventCorrelator, EventOutcome, JobOutcome, JobReport, JobRunner,
        PendingSet, PipelineError, PipelineStats, TagStep, TagStepReport,
    };

    let _ = PendingSet::new();
    let _ = PipelineStats::default();
    let _ = ConversionJob::new(std::path::PathBuf::from("/w/a.mp3"), "ogg");
    let _ = TagStep::SelfTransfer;

    let _: fn(&JobReport) -> &JobOutcome = |r| &r.outcome;
    let _: fn(&TagStepReport) -> bool = |s| s.result.is_ok();
    let _: fn(&EventOutcome) -> bool = |o| matches!(o, EventOutcome::Tracked);
    let _: fn(&PipelineError) -> bool = PipelineError::is_fault;
    let _: fn(&EventCorrelator) -> PipelineStats = EventCorrelator::stats;
    let _: Option<JobRunner> = None;
}

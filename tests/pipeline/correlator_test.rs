//! Event correlation: one conversion per finished file, tags in order,
//! failures contained.

use std::path::{Path, PathBuf};

use convertd::config::FormatsConfig;
use convertd::pipeline::{EventCorrelator, EventOutcome, JobOutcome, PipelineError, TagStep};
use convertd::watcher::RawEvent;

use super::mocks::{runner, Call, CallLog, MissingConverter, MockConverter, MockTagger};

fn formats(source: &str, target: &str) -> FormatsConfig {
    FormatsConfig {
        source_extension: source.to_string(),
        target_extension: target.to_string(),
    }
}

fn created(path: &str) -> RawEvent {
    RawEvent::Created(PathBuf::from(path))
}

fn closed(path: &str) -> RawEvent {
    RawEvent::ClosedAfterWrite(PathBuf::from(path))
}

fn correlator(log: &CallLog) -> EventCorrelator {
    EventCorrelator::new(
        &formats("src", "dst"),
        runner(MockConverter::new(log.clone()), MockTagger::new(log.clone())),
    )
}

#[tokio::test]
async fn created_then_closed_converts_and_tags_in_order() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    assert!(matches!(
        correlator.handle_event(created("/w/song.src")).await,
        EventOutcome::Tracked
    ));
    assert!(correlator.pending().contains(Path::new("/w/song.src")));

    let outcome = correlator.handle_event(closed("/w/song.src")).await;

    assert_eq!(
        log.calls(),
        vec![
            Call::convert("/w/song.src", "/w/song.dst"),
            Call::tag("/w/song.src", "/w/song.src"),
            Call::tag("/w/song.src", "/w/song.dst"),
        ]
    );

    let EventOutcome::Completed(report) = outcome else {
        panic!("expected completed job");
    };
    assert_eq!(report.job.target_path, PathBuf::from("/w/song.dst"));
    let JobOutcome::Converted { tag_steps } = &report.outcome else {
        panic!("expected conversion, got {:?}", report.outcome);
    };
    let steps: Vec<TagStep> = tag_steps.iter().map(|s| s.step).collect();
    assert_eq!(steps, vec![TagStep::SelfTransfer, TagStep::CrossTransfer]);

    assert!(correlator.pending().is_empty());
    assert_eq!(correlator.stats().converted, 1);
}

#[tokio::test]
async fn files_without_source_extension_are_never_converted() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    for path in ["/w/cover.jpg", "/w/song.dst", "/w/song.src.part", "/w/src"] {
        assert!(matches!(
            correlator.handle_event(created(path)).await,
            EventOutcome::Ignored
        ));
        assert!(matches!(
            correlator.handle_event(closed(path)).await,
            EventOutcome::Unmatched
        ));
    }

    assert!(log.calls().is_empty());
    assert!(correlator.pending().is_empty());
    assert_eq!(correlator.stats().ignored, 4);
}

#[tokio::test]
async fn duplicate_close_converts_once() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    correlator.handle_event(created("/w/song.src")).await;
    correlator.handle_event(closed("/w/song.src")).await;
    let second = correlator.handle_event(closed("/w/song.src")).await;

    assert!(matches!(second, EventOutcome::Unmatched));
    assert_eq!(log.converts().len(), 1);
    assert_eq!(log.tags().len(), 2);
}

#[tokio::test]
async fn duplicate_create_is_idempotent() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    correlator.handle_event(created("/w/song.src")).await;
    let again = correlator.handle_event(created("/w/song.src")).await;

    assert!(matches!(again, EventOutcome::AlreadyPending));
    assert_eq!(correlator.pending().len(), 1);

    correlator.handle_event(closed("/w/song.src")).await;
    correlator.handle_event(closed("/w/song.src")).await;
    assert_eq!(log.converts().len(), 1);
}

#[tokio::test]
async fn close_without_create_is_noop() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    let outcome = correlator.handle_event(closed("/w/song.src")).await;

    assert!(matches!(outcome, EventOutcome::Unmatched));
    assert!(log.calls().is_empty());
    assert_eq!(correlator.stats().unmatched, 1);
}

#[tokio::test]
async fn failed_conversion_skips_tagging() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::new(
        &formats("src", "dst"),
        runner(
            MockConverter::new(log.clone()).exit_code(1),
            MockTagger::new(log.clone()),
        ),
    );

    correlator.handle_event(created("/w/song.src")).await;
    let outcome = correlator.handle_event(closed("/w/song.src")).await;

    assert_eq!(log.calls(), vec![Call::convert("/w/song.src", "/w/song.dst")]);
    assert!(correlator.pending().is_empty());

    let EventOutcome::Completed(report) = outcome else {
        panic!("expected completed job");
    };
    assert!(matches!(
        report.outcome,
        JobOutcome::Failed(PipelineError::ConversionFailed {
            exit_code: Some(1),
            ..
        })
    ));
    assert_eq!(correlator.stats().conversion_failures, 1);
    assert_eq!(correlator.stats().converted, 0);
}

#[tokio::test]
async fn converter_that_cannot_start_is_contained() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::new(
        &formats("src", "dst"),
        runner(MissingConverter, MockTagger::new(log.clone())),
    );

    correlator.handle_event(created("/w/song.src")).await;
    let outcome = correlator.handle_event(closed("/w/song.src")).await;

    let EventOutcome::Completed(report) = outcome else {
        panic!("expected completed job");
    };
    assert!(matches!(
        report.outcome,
        JobOutcome::Failed(PipelineError::Convert { .. })
    ));
    assert!(log.tags().is_empty());
}

#[tokio::test]
async fn converter_panic_does_not_affect_other_files() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::new(
        &formats("src", "dst"),
        runner(
            MockConverter::new(log.clone()).panic_on("/w/a.src"),
            MockTagger::new(log.clone()),
        ),
    );

    correlator.handle_event(created("/w/a.src")).await;
    let crashed = correlator.handle_event(closed("/w/a.src")).await;

    let EventOutcome::Completed(report) = crashed else {
        panic!("expected completed job");
    };
    let JobOutcome::Failed(err) = &report.outcome else {
        panic!("expected fault, got {:?}", report.outcome);
    };
    assert!(err.is_fault());
    assert!(err.to_string().contains("converter crashed"));

    correlator.handle_event(created("/w/b.src")).await;
    correlator.handle_event(closed("/w/b.src")).await;

    assert_eq!(
        log.calls(),
        vec![
            Call::convert("/w/a.src", "/w/a.dst"),
            Call::convert("/w/b.src", "/w/b.dst"),
            Call::tag("/w/b.src", "/w/b.src"),
            Call::tag("/w/b.src", "/w/b.dst"),
        ]
    );
    assert_eq!(correlator.stats().faults, 1);
    assert_eq!(correlator.stats().converted, 1);
}

#[tokio::test]
async fn tag_failure_keeps_conversion_and_runs_both_steps() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::new(
        &formats("src", "dst"),
        runner(
            MockConverter::new(log.clone()),
            MockTagger::new(log.clone()).fail_to("/w/song.src"),
        ),
    );

    correlator.handle_event(created("/w/song.src")).await;
    let outcome = correlator.handle_event(closed("/w/song.src")).await;

    assert_eq!(log.tags().len(), 2);
    let EventOutcome::Completed(report) = outcome else {
        panic!("expected completed job");
    };
    assert!(report.outcome.is_converted());
    assert_eq!(report.outcome.tag_failures(), 1);

    let stats = correlator.stats();
    assert_eq!(stats.converted, 1);
    assert_eq!(stats.tag_failures, 1);

    // No retry: a later close for the same path does nothing.
    correlator.handle_event(closed("/w/song.src")).await;
    assert_eq!(log.converts().len(), 1);
}

#[tokio::test]
async fn interleaved_files_convert_independently() {
    let log = CallLog::default();
    let mut correlator = correlator(&log);

    correlator.handle_event(created("/w/a.src")).await;
    correlator.handle_event(created("/w/b.src")).await;
    correlator.handle_event(closed("/w/b.src")).await;
    correlator.handle_event(closed("/w/a.src")).await;

    assert_eq!(
        log.calls(),
        vec![
            Call::convert("/w/b.src", "/w/b.dst"),
            Call::tag("/w/b.src", "/w/b.src"),
            Call::tag("/w/b.src", "/w/b.dst"),
            Call::convert("/w/a.src", "/w/a.dst"),
            Call::tag("/w/a.src", "/w/a.src"),
            Call::tag("/w/a.src", "/w/a.dst"),
        ]
    );
    assert_eq!(correlator.stats().converted, 2);
}

#[tokio::test]
async fn extension_match_ignores_case() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::new(
        &formats("mp3", "ogg"),
        runner(MockConverter::new(log.clone()), MockTagger::new(log.clone())),
    );

    correlator.handle_event(created("/w/Album/TRACK01.MP3")).await;
    correlator.handle_event(closed("/w/Album/TRACK01.MP3")).await;

    assert_eq!(
        log.converts(),
        vec![Call::convert("/w/Album/TRACK01.MP3", "/w/Album/TRACK01.ogg")]
    );
}

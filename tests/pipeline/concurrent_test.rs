//! Concurrent dispatch and the event loop.

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use convertd::config::{DispatchConfig, DispatchMode, FormatsConfig};
use convertd::pipeline::{EventCorrelator, EventOutcome};
use convertd::watcher::RawEvent;

use super::mocks::{runner, Call, CallLog, MockConverter, MockTagger};

fn concurrent(max_parallel: usize) -> DispatchConfig {
    DispatchConfig {
        mode: DispatchMode::Concurrent,
        max_parallel,
    }
}

#[tokio::test]
async fn concurrent_mode_removes_before_dispatch() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::with_dispatch(
        &FormatsConfig::default(),
        &concurrent(2),
        runner(
            MockConverter::new(log.clone()).delay(Duration::from_millis(50)),
            MockTagger::new(log.clone()),
        ),
    );

    correlator
        .handle_event(RawEvent::Created(PathBuf::from("/w/a.mp3")))
        .await;
    let first = correlator
        .handle_event(RawEvent::ClosedAfterWrite(PathBuf::from("/w/a.mp3")))
        .await;
    let second = correlator
        .handle_event(RawEvent::ClosedAfterWrite(PathBuf::from("/w/a.mp3")))
        .await;

    assert!(matches!(first, EventOutcome::Dispatched(_)));
    assert!(matches!(second, EventOutcome::Unmatched));

    let reports = correlator.drain().await;
    assert_eq!(reports.len(), 1);
    assert_eq!(log.converts(), vec![Call::convert("/w/a.mp3", "/w/a.ogg")]);
    assert_eq!(correlator.stats().converted, 1);
}

#[tokio::test]
async fn concurrent_panic_is_isolated() {
    let log = CallLog::default();
    let mut correlator = EventCorrelator::with_dispatch(
        &FormatsConfig::default(),
        &concurrent(4),
        runner(
            MockConverter::new(log.clone()).panic_on("/w/a.mp3"),
            MockTagger::new(log.clone()),
        ),
    );

    for name in ["/w/a.mp3", "/w/b.mp3"] {
        correlator
            .handle_event(RawEvent::Created(PathBuf::from(name)))
            .await;
    }
    for name in ["/w/a.mp3", "/w/b.mp3"] {
        correlator
            .handle_event(RawEvent::ClosedAfterWrite(PathBuf::from(name)))
            .await;
    }

    let reports = correlator.drain().await;
    assert_eq!(reports.len(), 2);

    let stats = correlator.stats();
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.converted, 1);
    assert!(log.tags().contains(&Call::tag("/w/b.mp3", "/w/b.ogg")));
}

#[tokio::test]
async fn run_loop_survives_faults_and_stops_on_cancel() {
    let log = CallLog::default();
    let correlator = EventCorrelator::new(
        &FormatsConfig::default(),
        runner(
            MockConverter::new(log.clone()).panic_on("/w/a.mp3"),
            MockTagger::new(log.clone()),
        ),
    );

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(correlator.run(rx, cancel.clone()));

    for event in [
        RawEvent::Created(PathBuf::from("/w/a.mp3")),
        RawEvent::ClosedAfterWrite(PathBuf::from("/w/a.mp3")),
        RawEvent::Created(PathBuf::from("/w/b.mp3")),
        RawEvent::ClosedAfterWrite(PathBuf::from("/w/b.mp3")),
    ] {
        tx.send(event).unwrap();
    }

    // Wait until the second file has been tagged, then stop the loop.
    for _ in 0..100 {
        if log.tags().len() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(!handle.is_finished(), "loop must outlive a faulting file");
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stats.events, 4);
    assert_eq!(stats.faults, 1);
    assert_eq!(stats.converted, 1);
}

#[tokio::test]
async fn run_loop_ends_when_stream_closes() {
    let log = CallLog::default();
    let correlator = EventCorrelator::with_dispatch(
        &FormatsConfig::default(),
        &concurrent(1),
        runner(MockConverter::new(log.clone()), MockTagger::new(log.clone())),
    );

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tx.send(RawEvent::Created(PathBuf::from("/w/a.mp3"))).unwrap();
    tx.send(RawEvent::ClosedAfterWrite(PathBuf::from("/w/a.mp3")))
        .unwrap();
    drop(tx);

    let stats = correlator.run(rx, CancellationToken::new()).await;

    // In-flight jobs are drained before the loop returns.
    assert_eq!(stats.converted, 1);
    assert_eq!(log.calls().len(), 3);
}

//! Correlates created and closed-after-write events into conversion jobs.
//!
//! Per path the lifecycle is `Unseen -> Pending -> Converting -> Done`.
//! Only `Pending` is stored; `Done` is simply "no longer tracked".

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{DispatchConfig, DispatchMode, FormatsConfig};
use crate::watcher::RawEvent;

use super::{has_extension, ConversionJob, JobReport, JobRunner, PendingSet, PipelineStats};

/// What handling one event did.
#[derive(Debug)]
pub enum EventOutcome {
    /// The file is now pending.
    Tracked,
    /// The file was already pending.
    AlreadyPending,
    /// Created, but not a source-format file.
    Ignored,
    /// Closed, but not pending.
    Unmatched,
    /// The job ran to completion on this call.
    Completed(JobReport),
    /// The job was handed to a worker task.
    Dispatched(ConversionJob),
}

/// Where jobs go once a file is ready.
enum Dispatcher {
    /// Await each job before the next event.
    Sequential,
    /// Spawn each job; reports come back over a channel.
    Concurrent {
        tasks: JoinSet<()>,
        permits: Arc<Semaphore>,
        report_tx: mpsc::UnboundedSender<JobReport>,
        report_rx: mpsc::UnboundedReceiver<JobReport>,
    },
}

impl Dispatcher {
    fn new(config: &DispatchConfig) -> Self {
        match config.mode {
            DispatchMode::Sequential => Self::Sequential,
            DispatchMode::Concurrent => {
                let (report_tx, report_rx) = mpsc::unbounded_channel();
                Self::Concurrent {
                    tasks: JoinSet::new(),
                    permits: Arc::new(Semaphore::new(config.max_parallel.max(1))),
                    report_tx,
                    report_rx,
                }
            }
        }
    }
}

/// The state machine between the watcher and the conversion backends.
///
/// Owns the [`PendingSet`]; it is created when watching starts and dropped
/// when watching stops.
pub struct EventCorrelator {
    pending: PendingSet,
    source_extension: String,
    target_extension: String,
    runner: JobRunner,
    dispatcher: Dispatcher,
    stats: PipelineStats,
}

impl EventCorrelator {
    /// Create a sequential correlator.
    #[must_use]
    pub fn new(formats: &FormatsConfig, runner: JobRunner) -> Self {
        Self::with_dispatch(formats, &DispatchConfig::default(), runner)
    }

    /// Create a correlator with an explicit dispatch mode.
    #[must_use]
    pub fn with_dispatch(
        formats: &FormatsConfig,
        dispatch: &DispatchConfig,
        runner: JobRunner,
    ) -> Self {
        Self {
            pending: PendingSet::new(),
            source_extension: formats.source_extension.clone(),
            target_extension: formats.target_extension.clone(),
            runner,
            dispatcher: Dispatcher::new(dispatch),
            stats: PipelineStats::default(),
        }
    }

    /// Paths currently awaiting their close event.
    #[must_use]
    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    /// Counters so far. Jobs still running in concurrent mode are not
    /// included until [`drain`](Self::drain) or [`collect_reports`](Self::collect_reports).
    #[must_use]
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Handle one event.
    ///
    /// In sequential mode a ready file is converted and tagged before this
    /// returns. The pending entry is always removed before the job starts,
    /// so a repeated close event finds nothing to do.
    pub async fn handle_event(&mut self, event: RawEvent) -> EventOutcome {
        self.stats.events += 1;
        match event {
            RawEvent::Created(path) => self.on_created(path),
            RawEvent::ClosedAfterWrite(path) => self.on_closed(path).await,
        }
    }

    fn on_created(&mut self, path: PathBuf) -> EventOutcome {
        if !has_extension(&path, &self.source_extension) {
            tracing::debug!(path = %path.display(), "Ignoring created file");
            self.stats.ignored += 1;
            return EventOutcome::Ignored;
        }

        let shown = path.display().to_string();
        if self.pending.add(path) {
            tracing::info!(path = %shown, "Found a created file");
            self.stats.tracked += 1;
            EventOutcome::Tracked
        } else {
            tracing::debug!(path = %shown, "File already pending");
            EventOutcome::AlreadyPending
        }
    }

    async fn on_closed(&mut self, path: PathBuf) -> EventOutcome {
        if !self.pending.remove_if_present(&path) {
            tracing::debug!(path = %path.display(), "Close event for untracked file");
            self.stats.unmatched += 1;
            return EventOutcome::Unmatched;
        }

        tracing::info!(path = %path.display(), "File closed after write");
        let job = ConversionJob::new(path, &self.target_extension);

        match &mut self.dispatcher {
            Dispatcher::Sequential => {
                let report = self.runner.execute(job).await;
                self.stats.record(&report);
                EventOutcome::Completed(report)
            }
            Dispatcher::Concurrent {
                tasks,
                permits,
                report_tx,
                ..
            } => {
                let runner = self.runner.clone();
                let permits = Arc::clone(permits);
                let report_tx = report_tx.clone();
                let task_job = job.clone();
                tasks.spawn(async move {
                    // The semaphore is never closed.
                    let Ok(_permit) = permits.acquire_owned().await else {
                        return;
                    };
                    let report = runner.execute(task_job).await;
                    let _ = report_tx.send(report);
                });
                EventOutcome::Dispatched(job)
            }
        }
    }

    /// Fold in reports from finished workers without waiting.
    ///
    /// Returns the reports collected. Always empty in sequential mode.
    pub fn collect_reports(&mut self) -> Vec<JobReport> {
        let Dispatcher::Concurrent {
            tasks, report_rx, ..
        } = &mut self.dispatcher
        else {
            return Vec::new();
        };

        // Reap finished tasks so the set does not grow without bound.
        while tasks.try_join_next().is_some() {}

        let mut reports = Vec::new();
        while let Ok(report) = report_rx.try_recv() {
            self.stats.record(&report);
            reports.push(report);
        }
        reports
    }

    /// Wait for every dispatched job to finish and fold in its report.
    pub async fn drain(&mut self) -> Vec<JobReport> {
        if let Dispatcher::Concurrent { tasks, .. } = &mut self.dispatcher {
            while let Some(joined) = tasks.join_next().await {
                if let Err(e) = joined {
                    tracing::error!(error = %e, "Worker task ended abnormally");
                }
            }
        }
        self.collect_reports()
    }

    /// Consume events until the channel closes or `cancel` fires.
    ///
    /// Returns the final counters after in-flight jobs have finished.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<RawEvent>,
        cancel: CancellationToken,
    ) -> PipelineStats {
        loop {
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!("Event loop cancelled");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        tracing::info!("Event stream closed");
                        break;
                    };
                    self.handle_event(event).await;
                    self.collect_reports();
                }
            }
        }

        self.drain().await;
        if !self.pending.is_empty() {
            tracing::info!(
                pending = self.pending.len(),
                "Stopping with files still being written"
            );
        }
        self.stats
    }
}

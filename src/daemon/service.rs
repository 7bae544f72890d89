//! Wires configuration, watcher and pipeline together.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{DaemonConfig, TagBackend};
use crate::convert::{CommandConverter, CommandTemplate};
use crate::pipeline::{EventCorrelator, JobRunner, PipelineStats};
use crate::tags::{CommandTagTransferor, LoftyTagTransferor, TagTransferor};
use crate::watcher::DirWatcher;

use super::DaemonError;

/// Build the job runner described by `config`.
#[must_use]
pub fn build_runner(config: &DaemonConfig) -> JobRunner {
    let converter = Arc::new(CommandConverter::from_config(&config.converter));

    let tagger: Arc<dyn TagTransferor> = match config.tags.backend {
        TagBackend::Builtin => Arc::new(LoftyTagTransferor::new()),
        TagBackend::Command => Arc::new(CommandTagTransferor::new(
            config.tags.program.clone().unwrap_or_default(),
            CommandTemplate::new(config.tags.args.iter().cloned()),
        )),
    };

    JobRunner::new(converter, tagger)
}

/// Watch `config.watch_dir` and convert files until `cancel` fires.
///
/// # Errors
///
/// Returns an error only if the watch cannot be set up. Failures while
/// handling individual files are logged and counted, never returned.
pub async fn serve(
    config: &DaemonConfig,
    cancel: CancellationToken,
) -> Result<PipelineStats, DaemonError> {
    let (watcher, events) = DirWatcher::new(config.watch_dir.clone()).inspect_err(|e| {
        tracing::error!(root = %e.path().display(), error = %e, "Watch setup failed");
    })?;

    tracing::info!(
        watch_dir = %config.watch_dir.display(),
        source = %config.formats.source_extension,
        target = %config.formats.target_extension,
        mode = ?config.dispatch.mode,
        "Started"
    );

    let correlator =
        EventCorrelator::with_dispatch(&config.formats, &config.dispatch, build_runner(config));
    let stats = correlator.run(events, cancel).await;

    watcher.stop();
    tracing::info!(
        events = stats.events,
        jobs = stats.finished(),
        converted = stats.converted,
        conversion_failures = stats.conversion_failures,
        tag_failures = stats.tag_failures,
        faults = stats.faults,
        "Stopped"
    );

    Ok(stats)
}

//! Runs one conversion job: convert, then transfer tags.

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use crate::convert::Converter;
use crate::tags::TagTransferor;

use super::{ConversionJob, JobOutcome, JobReport, PipelineError, TagStep, TagStepReport};

/// Executes conversion jobs against a converter and a tag transferor.
///
/// Cheap to clone; clones share the same backends.
#[derive(Clone)]
pub struct JobRunner {
    converter: Arc<dyn Converter>,
    tagger: Arc<dyn TagTransferor>,
}

impl JobRunner {
    #[must_use]
    pub fn new(converter: Arc<dyn Converter>, tagger: Arc<dyn TagTransferor>) -> Self {
        Self { converter, tagger }
    }

    /// Run `job` inside a failure boundary.
    ///
    /// The job runs on its own task. A panic anywhere in conversion or
    /// tagging is turned into [`PipelineError::Fault`]; this never panics
    /// and never returns an error.
    pub async fn execute(&self, job: ConversionJob) -> JobReport {
        let started = Instant::now();
        let runner = self.clone();
        let task_job = job.clone();

        let outcome = match tokio::spawn(async move { runner.run(&task_job).await }).await {
            Ok(outcome) => outcome,
            Err(e) => {
                let message = if e.is_panic() {
                    panic_message(e.into_panic().as_ref())
                } else {
                    "task cancelled".to_string()
                };
                let err = PipelineError::Fault {
                    path: job.source_path.clone(),
                    message,
                };
                tracing::error!(error = %err, "Pipeline fault contained");
                JobOutcome::Failed(err)
            }
        };

        JobReport {
            job,
            outcome,
            elapsed: started.elapsed(),
        }
    }

    /// Convert, then run both tag steps in order.
    async fn run(&self, job: &ConversionJob) -> JobOutcome {
        let source = job.source_path.as_path();
        let target = job.target_path.as_path();

        let result = match self.converter.convert(source, target).await {
            Ok(result) => result,
            Err(error) => {
                let err = PipelineError::Convert {
                    source_path: source.to_path_buf(),
                    error,
                };
                tracing::error!(error = %err, "Convert ERROR");
                return JobOutcome::Failed(err);
            }
        };

        if !result.success() {
            let err = PipelineError::ConversionFailed {
                source_path: source.to_path_buf(),
                exit_code: result.exit_code,
            };
            tracing::error!(
                source = %source.display(),
                target = %target.display(),
                exit_code = ?result.exit_code,
                "Convert ERROR"
            );
            return JobOutcome::Failed(err);
        }

        tracing::info!(
            source = %source.display(),
            target = %target.display(),
            "Convert OK"
        );

        let mut tag_steps = Vec::with_capacity(2);
        for (step, from, to) in [
            (TagStep::SelfTransfer, source, source),
            (TagStep::CrossTransfer, source, target),
        ] {
            let result = match self.tagger.transfer(from, to).await {
                Ok(outcome) => {
                    tracing::info!(
                        %step,
                        from = %from.display(),
                        to = %to.display(),
                        ?outcome,
                        "Tags transferred"
                    );
                    Ok(outcome)
                }
                Err(error) => {
                    let unsupported = error.is_unsupported();
                    let err = PipelineError::TagTransfer {
                        from: from.to_path_buf(),
                        to: to.to_path_buf(),
                        error,
                    };
                    if unsupported {
                        tracing::warn!(%step, error = %err, "Destination cannot hold tags");
                    } else {
                        tracing::warn!(%step, error = %err, "Failed to transfer tags");
                    }
                    Err(err)
                }
            };
            tag_steps.push(TagStepReport { step, result });
        }

        JobOutcome::Converted { tag_steps }
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

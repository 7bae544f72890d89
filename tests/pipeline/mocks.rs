//! Recording converter and tag transferor doubles.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use convertd::convert::{ConversionResult, ConvertError, Converter};
use convertd::pipeline::JobRunner;
use convertd::tags::{TagError, TagTransferOutcome, TagTransferor};

/// One backend invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Convert(PathBuf, PathBuf),
    Tag(PathBuf, PathBuf),
}

impl Call {
    pub fn convert(source: &str, target: &str) -> Self {
        Self::Convert(PathBuf::from(source), PathBuf::from(target))
    }

    pub fn tag(from: &str, to: &str) -> Self {
        Self::Tag(PathBuf::from(from), PathBuf::from(to))
    }
}

/// Shared, ordered record of backend calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn converts(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Convert(..)))
            .collect()
    }

    pub fn tags(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Tag(..)))
            .collect()
    }
}

/// Converter that records calls and returns a fixed exit code.
pub struct MockConverter {
    log: CallLog,
    exit_code: i32,
    panic_on: Option<PathBuf>,
    delay: Option<Duration>,
}

impl MockConverter {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            exit_code: 0,
            panic_on: None,
            delay: None,
        }
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn panic_on(mut self, source: &str) -> Self {
        self.panic_on = Some(PathBuf::from(source));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Converter for MockConverter {
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<ConversionResult, ConvertError> {
        self.log
            .push(Call::Convert(source.to_path_buf(), target.to_path_buf()));

        if self.panic_on.as_deref() == Some(source) {
            panic!("converter crashed on {}", source.display());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        Ok(ConversionResult {
            exit_code: Some(self.exit_code),
            source_path: source.to_path_buf(),
            target_path: target.to_path_buf(),
        })
    }
}

/// Converter that cannot be started at all.
pub struct MissingConverter;

#[async_trait]
impl Converter for MissingConverter {
    async fn convert(
        &self,
        _source: &Path,
        _target: &Path,
    ) -> Result<ConversionResult, ConvertError> {
        Err(ConvertError::NotFound {
            program: "sox".to_string(),
        })
    }
}

/// Tag transferor that records calls and can fail for one destination.
pub struct MockTagger {
    log: CallLog,
    fail_to: Option<PathBuf>,
}

impl MockTagger {
    pub fn new(log: CallLog) -> Self {
        Self { log, fail_to: None }
    }

    pub fn fail_to(mut self, to: &str) -> Self {
        self.fail_to = Some(PathBuf::from(to));
        self
    }
}

#[async_trait]
impl TagTransferor for MockTagger {
    async fn transfer(&self, from: &Path, to: &Path) -> Result<TagTransferOutcome, TagError> {
        self.log.push(Call::Tag(from.to_path_buf(), to.to_path_buf()));

        if self.fail_to.as_deref() == Some(to) {
            return Err(TagError::Unsupported {
                path: to.to_path_buf(),
                tag_type: "VorbisComments".to_string(),
            });
        }
        Ok(TagTransferOutcome::Transferred { items: Some(3) })
    }
}

/// Runner over the given doubles.
pub fn runner(converter: impl Converter + 'static, tagger: impl TagTransferor + 'static) -> JobRunner {
    JobRunner::new(Arc::new(converter), Arc::new(tagger))
}

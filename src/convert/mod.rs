//! External audio conversion.
//!
//! The pipeline only sees the [`Converter`] trait; [`CommandConverter`] runs
//! an external program such as `sox`.

mod command;
mod template;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

pub use command::*;
pub use template::{display_command, CommandTemplate};

/// Error type for running the external converter.
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    /// The converter binary was not found.
    #[error("Converter binary not found: {program}")]
    NotFound { program: String },
    /// Permission denied when spawning.
    #[error("Permission denied running converter: {program}")]
    PermissionDenied { program: String },
    /// The converter did not finish in time and was killed.
    #[error("Converter timed out after {secs}s")]
    TimedOut { secs: u64 },
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    /// Create a `ConvertError` from a spawn error, classifying common cases.
    pub(crate) fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound {
                program: program.to_string(),
            },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied {
                program: program.to_string(),
            },
            _ => Self::Io(err),
        }
    }
}

/// Outcome of one converter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// Exit code, `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// File that was converted.
    pub source_path: PathBuf,
    /// File the converter was asked to produce.
    pub target_path: PathBuf,
}

impl ConversionResult {
    /// Whether the converter exited with status 0.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Converts one audio file into another format.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Convert `source` into `target`.
    ///
    /// A non-zero exit is reported through [`ConversionResult`]; `Err` is
    /// reserved for failures to run the converter at all.
    async fn convert(&self, source: &Path, target: &Path)
        -> Result<ConversionResult, ConvertError>;
}

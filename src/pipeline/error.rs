//! Pipeline error types.

use std::path::PathBuf;

use crate::convert::ConvertError;
use crate::tags::TagError;

/// Failures contained within one file's pipeline.
///
/// None of these stop the event loop.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    /// The converter ran and exited unsuccessfully.
    #[error("Conversion of {source_path} failed with exit code {}", .exit_code.map_or_else(|| "none (signal)".to_string(), |c| c.to_string()))]
    ConversionFailed {
        source_path: PathBuf,
        exit_code: Option<i32>,
    },

    /// The converter could not be run to completion.
    #[error("Converter could not process {source_path}: {error}")]
    Convert {
        source_path: PathBuf,
        #[source]
        error: ConvertError,
    },

    /// A tag transfer failed; the converted file is kept.
    #[error("Tag transfer {from} => {to} failed: {error}")]
    TagTransfer {
        from: PathBuf,
        to: PathBuf,
        #[source]
        error: TagError,
    },

    /// Anything else, including panics, while handling one file.
    #[error("Unexpected fault while handling {path}: {message}")]
    Fault { path: PathBuf, message: String },
}

impl PipelineError {
    /// Whether the converter failed or could not run.
    #[must_use]
    pub fn is_conversion_failure(&self) -> bool {
        matches!(self, Self::ConversionFailed { .. } | Self::Convert { .. })
    }

    /// Whether this is an unanticipated fault.
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }
}

//! External converter process.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use super::template::{display_command, CommandTemplate};
use super::{ConversionResult, ConvertError, Converter};
use crate::config::ConverterConfig;

/// Placeholder for the source path in converter arguments.
pub const SOURCE_PLACEHOLDER: &str = "{source}";
/// Placeholder for the target path in converter arguments.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Default converter program.
pub const DEFAULT_CONVERTER_PROGRAM: &str = "sox";

/// Default converter arguments: clear the free-text comment so the tagging
/// step alone decides the metadata.
#[must_use]
pub fn default_converter_args() -> Vec<String> {
    [SOURCE_PLACEHOLDER, "--comment", "", TARGET_PLACEHOLDER]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Runs an external program to convert one file.
#[derive(Debug, Clone)]
pub struct CommandConverter {
    program: String,
    args: CommandTemplate,
    timeout: Option<Duration>,
}

impl CommandConverter {
    /// Create a converter running `program` with templated `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: CommandTemplate) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// A `sox` converter with the default arguments.
    #[must_use]
    pub fn sox() -> Self {
        Self::new(
            DEFAULT_CONVERTER_PROGRAM,
            CommandTemplate::new(default_converter_args()),
        )
    }

    /// Build a converter from configuration.
    #[must_use]
    pub fn from_config(config: &ConverterConfig) -> Self {
        let converter = Self::new(
            config.program.clone(),
            CommandTemplate::new(config.args.iter().cloned()),
        );
        match config.timeout_secs {
            Some(secs) => converter.with_timeout(Duration::from_secs(secs)),
            None => converter,
        }
    }

    /// Kill the converter if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Get the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Get the timeout, if set.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Build the command-line arguments for one conversion.
    #[must_use]
    pub fn build_args(&self, source: &Path, target: &Path) -> Vec<std::ffi::OsString> {
        self.args
            .render(&[(SOURCE_PLACEHOLDER, source), (TARGET_PLACEHOLDER, target)])
    }
}

impl Default for CommandConverter {
    fn default() -> Self {
        Self::sox()
    }
}

#[async_trait]
impl Converter for CommandConverter {
    async fn convert(
        &self,
        source: &Path,
        target: &Path,
    ) -> Result<ConversionResult, ConvertError> {
        let args = self.build_args(source, target);
        tracing::info!(
            command = %display_command(&self.program, &args),
            "Running converter"
        );

        let child = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ConvertError::from_spawn(&self.program, e))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, child.wait_with_output())
                .await
                .map_err(|_| ConvertError::TimedOut {
                    secs: timeout.as_secs(),
                })??,
            None => child.wait_with_output().await?,
        };

        let result = ConversionResult {
            exit_code: output.status.code(),
            source_path: source.to_path_buf(),
            target_path: target.to_path_buf(),
        };

        if !result.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::debug!(
                program = %self.program,
                stderr = stderr.lines().last().unwrap_or_default(),
                "Converter stderr"
            );
        }

        Ok(result)
    }
}

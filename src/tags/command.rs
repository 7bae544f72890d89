//! Tag transfer through an external utility.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::{TagError, TagTransferOutcome, TagTransferor};
use crate::convert::{display_command, CommandTemplate};

/// Placeholder for the file tags are read from.
pub const FROM_PLACEHOLDER: &str = "{from}";
/// Placeholder for the file tags are written to.
pub const TO_PLACEHOLDER: &str = "{to}";

/// Runs an external program to copy tags between two files.
#[derive(Debug, Clone)]
pub struct CommandTagTransferor {
    program: String,
    args: CommandTemplate,
}

impl CommandTagTransferor {
    /// Create a transferor running `program` with templated `args`.
    #[must_use]
    pub fn new(program: impl Into<String>, args: CommandTemplate) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Get the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the command-line arguments for one transfer.
    #[must_use]
    pub fn build_args(&self, from: &Path, to: &Path) -> Vec<std::ffi::OsString> {
        self.args
            .render(&[(FROM_PLACEHOLDER, from), (TO_PLACEHOLDER, to)])
    }
}

#[async_trait]
impl TagTransferor for CommandTagTransferor {
    async fn transfer(&self, from: &Path, to: &Path) -> Result<TagTransferOutcome, TagError> {
        let args = self.build_args(from, to);
        tracing::debug!(
            command = %display_command(&self.program, &args),
            "Running tag utility"
        );

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|source| TagError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(TagTransferOutcome::Transferred { items: None })
        } else {
            Err(TagError::CommandFailed {
                program: self.program.clone(),
                code: status.code(),
            })
        }
    }
}

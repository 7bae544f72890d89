//! Configuration types.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::convert::{
    default_converter_args, CommandTemplate, DEFAULT_CONVERTER_PROGRAM, SOURCE_PLACEHOLDER,
    TARGET_PLACEHOLDER,
};
use crate::tags::{FROM_PLACEHOLDER, TO_PLACEHOLDER};

use super::ConfigError;

/// Source and target audio formats, by file extension.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FormatsConfig {
    /// Extension of files to convert, without the dot.
    pub source_extension: String,
    /// Extension of converted files, without the dot.
    pub target_extension: String,
}

impl Default for FormatsConfig {
    fn default() -> Self {
        Self {
            source_extension: "mp3".to_string(),
            target_extension: "ogg".to_string(),
        }
    }
}

/// External converter invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConverterConfig {
    /// Program to run.
    pub program: String,
    /// Arguments; `{source}` and `{target}` are substituted per file.
    pub args: Vec<String>,
    /// Kill the converter after this many seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: DEFAULT_CONVERTER_PROGRAM.to_string(),
            args: default_converter_args(),
            timeout_secs: None,
        }
    }
}

/// Which tag transfer implementation to use.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TagBackend {
    /// In-process transfer.
    #[default]
    Builtin,
    /// External utility configured by `program` and `args`.
    Command,
}

/// Tag transfer configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TagsConfig {
    pub backend: TagBackend,
    /// Tag utility, used by the `command` backend.
    pub program: Option<String>,
    /// Arguments; `{from}` and `{to}` are substituted per call.
    pub args: Vec<String>,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            backend: TagBackend::Builtin,
            program: None,
            args: vec![FROM_PLACEHOLDER.to_string(), TO_PLACEHOLDER.to_string()],
        }
    }
}

/// How conversions are scheduled relative to the event loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Each event is handled to completion before the next is read.
    #[default]
    Sequential,
    /// Conversions run as separate tasks.
    Concurrent,
}

/// Scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: DispatchMode,
    /// Upper bound on conversions running at once in concurrent mode.
    pub max_parallel: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            mode: DispatchMode::Sequential,
            max_parallel: 4,
        }
    }
}

/// Configuration for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Root of the watched directory tree.
    pub watch_dir: PathBuf,
    /// Where the running daemon records its pid.
    pub pid_file: PathBuf,
    /// Log file; logs also go to stderr.
    pub log_file: PathBuf,
    pub formats: FormatsConfig,
    pub converter: ConverterConfig,
    pub tags: TagsConfig,
    pub dispatch: DispatchConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            watch_dir: PathBuf::from("/tmp"),
            pid_file: PathBuf::from("/var/run/convertd.pid"),
            log_file: PathBuf::from("/var/log/convertd.log"),
            formats: FormatsConfig::default(),
            converter: ConverterConfig::default(),
            tags: TagsConfig::default(),
            dispatch: DispatchConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// Check the configuration before anything is started.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_absolute("watch_dir", &self.watch_dir)?;
        require_absolute("pid_file", &self.pid_file)?;
        require_absolute("log_file", &self.log_file)?;

        validate_extension("formats.source_extension", &self.formats.source_extension)?;
        validate_extension("formats.target_extension", &self.formats.target_extension)?;
        if self
            .formats
            .source_extension
            .eq_ignore_ascii_case(&self.formats.target_extension)
        {
            return Err(ConfigError::Invalid {
                field: "formats.target_extension",
                reason: "must differ from the source extension".to_string(),
            });
        }

        if self.converter.program.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "converter.program",
                reason: "must not be empty".to_string(),
            });
        }
        require_placeholders(
            "converter.args",
            &self.converter.args,
            &[SOURCE_PLACEHOLDER, TARGET_PLACEHOLDER],
        )?;
        if self.converter.timeout_secs == Some(0) {
            return Err(ConfigError::Invalid {
                field: "converter.timeout_secs",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.tags.backend == TagBackend::Command
            && self
                .tags
                .program
                .as_deref()
                .map_or(true, |p| p.trim().is_empty())
        {
            return Err(ConfigError::Invalid {
                field: "tags.program",
                reason: "required by the command backend".to_string(),
            });
        }
        if self.tags.backend == TagBackend::Command {
            require_placeholders("tags.args", &self.tags.args, &[FROM_PLACEHOLDER, TO_PLACEHOLDER])?;
        }

        if self.dispatch.max_parallel == 0 {
            return Err(ConfigError::Invalid {
                field: "dispatch.max_parallel",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

fn require_absolute(field: &'static str, path: &Path) -> Result<(), ConfigError> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ConfigError::NotAbsolute {
            field,
            path: path.to_path_buf(),
        })
    }
}

fn require_placeholders(
    field: &'static str,
    args: &[String],
    placeholders: &[&str],
) -> Result<(), ConfigError> {
    let template = CommandTemplate::new(args.iter().cloned());
    match placeholders.iter().find(|p| !template.mentions(p)) {
        Some(missing) => Err(ConfigError::Invalid {
            field,
            reason: format!("must mention {missing}"),
        }),
        None => Ok(()),
    }
}

fn validate_extension(field: &'static str, ext: &str) -> Result<(), ConfigError> {
    if ext.is_empty() {
        return Err(ConfigError::Invalid {
            field,
            reason: "must not be empty".to_string(),
        });
    }
    if ext.contains('.') || ext.contains(std::path::is_separator) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("{ext:?} must be a bare extension"),
        });
    }
    Ok(())
}

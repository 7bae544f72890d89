//! Argument templates for external commands.

use std::borrow::Cow;
use std::ffi::OsString;
use std::path::Path;

/// Command-line arguments with `{name}` placeholders.
///
/// Arguments are passed to the program directly, never through a shell, so
/// paths containing spaces or quotes need no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    args: Vec<String>,
}

impl CommandTemplate {
    /// Create a template from raw argument strings.
    #[must_use]
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// The unrendered arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Whether `placeholder` (e.g. `{source}`) appears in any argument.
    #[must_use]
    pub fn mentions(&self, placeholder: &str) -> bool {
        self.args.iter().any(|a| a.contains(placeholder))
    }

    /// Substitute placeholders with paths.
    ///
    /// An argument that is exactly a placeholder becomes the path verbatim,
    /// so non-UTF-8 paths survive. Embedded placeholders are replaced with
    /// the lossy string form.
    #[must_use]
    pub fn render(&self, values: &[(&str, &Path)]) -> Vec<OsString> {
        self.args
            .iter()
            .map(|arg| {
                if let Some((_, path)) = values.iter().find(|(name, _)| arg == name) {
                    return path.as_os_str().to_os_string();
                }
                let mut rendered = arg.clone();
                for (name, path) in values {
                    if rendered.contains(name) {
                        rendered = rendered.replace(name, &path.to_string_lossy());
                    }
                }
                OsString::from(rendered)
            })
            .collect()
    }
}

/// Format a program and its arguments as a shell-safe line for logging.
#[must_use]
pub fn display_command(program: &str, args: &[OsString]) -> String {
    std::iter::once(Cow::Borrowed(program))
        .chain(args.iter().map(|a| a.to_string_lossy()))
        .map(|part| shell_escape::escape(part).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

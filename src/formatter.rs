//! The formatter under test.
//!
//! The harness never formats anything itself. It talks to a [`Formatter`], either an
//! in-process implementation (any matching closure works) or an external program driven
//! through [`CommandFormatter`].

use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;

use serde::Serialize;
use thiserror::Error;

use crate::selection::Selection;

/// Settings handed to the formatter for one case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatSettings {
    pub right_margin: usize,
    /// Whether line breaks already in the input are kept.
    pub keep_line_breaks: bool,
    /// Maximum run of blank lines kept from the input.
    pub keep_blank_lines: usize,
}

impl FormatSettings {
    /// The settings every fixture case runs with, at the given margin.
    pub fn for_margin(right_margin: usize) -> Self {
        Self {
            right_margin,
            keep_line_breaks: false,
            keep_blank_lines: 1,
        }
    }
}

/// A structured failure reported by the formatter instead of output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FormatFailure {
    pub message: String,
}

impl FormatFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Formatter output with the selection remapped onto it, when the formatter supports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatted {
    pub text: String,
    pub selection: Option<Selection>,
}

pub trait Formatter {
    fn format(
        &self,
        source: &str,
        whole_program: bool,
        settings: &FormatSettings,
    ) -> Result<String, FormatFailure>;

    /// Formats `source` and reports where `selection` ended up.
    ///
    /// The default formats the whole text and reports no selection, which turns
    /// selection checks off for that formatter.
    fn format_selection(
        &self,
        source: &str,
        whole_program: bool,
        settings: &FormatSettings,
        selection: Selection,
    ) -> Result<Formatted, FormatFailure> {
        let _ = selection;
        self.format(source, whole_program, settings)
            .map(|text| Formatted {
                text,
                selection: None,
            })
    }
}

impl<F> Formatter for F
where
    F: Fn(&str, bool, &FormatSettings) -> Result<String, FormatFailure>,
{
    fn format(
        &self,
        source: &str,
        whole_program: bool,
        settings: &FormatSettings,
    ) -> Result<String, FormatFailure> {
        self(source, whole_program, settings)
    }
}

/// Runs an external formatter once per case: source on stdin, result on stdout.
///
/// Arguments may use these placeholders:
/// - `{margin}`: the right margin
/// - `{kind}`: `unit` for whole programs, `stmt` for fragments
/// - `{keep_blank_lines}` and `{keep_line_breaks}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFormatter {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandFormatter {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Builds a formatter from a full command line, program first.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self::new(program, args.to_vec()))
    }

    pub fn expand_args(&self, whole_program: bool, settings: &FormatSettings) -> Vec<String> {
        let kind = if whole_program { "unit" } else { "stmt" };
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{margin}", &settings.right_margin.to_string())
                    .replace("{kind}", kind)
                    .replace("{keep_blank_lines}", &settings.keep_blank_lines.to_string())
                    .replace("{keep_line_breaks}", &settings.keep_line_breaks.to_string())
            })
            .collect()
    }
}

impl Formatter for CommandFormatter {
    fn format(
        &self,
        source: &str,
        whole_program: bool,
        settings: &FormatSettings,
    ) -> Result<String, FormatFailure> {
        let program = self.program.display();
        let mut child = Command::new(&self.program)
            .args(self.expand_args(whole_program, settings))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FormatFailure::new(format!("failed to start `{}`: {}", program, e)))?;

        // Stdin is written from its own thread while stdout drains.
        let stdin = child.stdin.take();
        let input = source.to_string();
        let writer = thread::spawn(move || match stdin {
            Some(mut stdin) => stdin.write_all(input.as_bytes()),
            None => Ok(()),
        });
        let output = child
            .wait_with_output()
            .map_err(|e| FormatFailure::new(format!("failed to wait for `{}`: {}", program, e)))?;
        // A formatter that exits early closes the pipe; its exit status says why.
        if let Ok(Err(e)) = writer.join() {
            if e.kind() != ErrorKind::BrokenPipe {
                return Err(FormatFailure::new(format!(
                    "failed to write to `{}`: {}",
                    program, e
                )));
            }
        }

        if !output.status.success() {
            return Err(FormatFailure::new(format!(
                "`{}` exited with {}: {}",
                program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        String::from_utf8(output.stdout)
            .map_err(|_| FormatFailure::new(format!("`{}` wrote non-UTF-8 output", program)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = FormatSettings::for_margin(76);
        assert_eq!(settings.right_margin, 76);
        assert!(!settings.keep_line_breaks);
        assert_eq!(settings.keep_blank_lines, 1);
    }

    #[test]
    fn test_closure_formatter_has_no_selection() {
        let upper = |s: &str, _: bool, _: &FormatSettings| Ok::<_, FormatFailure>(s.to_uppercase());
        let out = upper
            .format_selection("ab", true, &FormatSettings::for_margin(80), Selection::new(0, 1))
            .unwrap();
        assert_eq!(out.text, "AB");
        assert_eq!(out.selection, None);
    }

    #[test]
    fn test_placeholders_expand() {
        let cmd = CommandFormatter::new(
            "dartfmt",
            vec![
                "--line-length={margin}".to_string(),
                "--{kind}".to_string(),
                "{keep_blank_lines}/{keep_line_breaks}".to_string(),
            ],
        );
        let args = cmd.expand_args(false, &FormatSettings::for_margin(42));
        assert_eq!(args, vec!["--line-length=42", "--stmt", "1/false"]);
    }

    #[test]
    fn test_from_argv() {
        assert_eq!(CommandFormatter::from_argv(&[]), None);
        let cmd = CommandFormatter::from_argv(&["fmt".to_string(), "-".to_string()]).unwrap();
        assert_eq!(cmd, CommandFormatter::new("fmt", vec!["-".to_string()]));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_pipes_stdin() {
        let cat = CommandFormatter::new("cat", vec![]);
        let out = cat
            .format("main() {}\n", true, &FormatSettings::for_margin(80))
            .unwrap();
        assert_eq!(out, "main() {}\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_formatter_failure_is_structured() {
        let fail = CommandFormatter::new("sh", vec!["-c".to_string(), "echo bad >&2; exit 3".to_string()]);
        let err = fail
            .format("x", true, &FormatSettings::for_margin(80))
            .unwrap_err();
        assert!(err.message.contains("bad"));

        let missing = CommandFormatter::new("/no/such/formatter", vec![]);
        assert!(missing
            .format("x", true, &FormatSettings::for_margin(80))
            .is_err());
    }
}

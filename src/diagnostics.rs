//!
//! ****************************************************************************************
//! ** ERROR CONSTRUCTION RULES FOR fmtspec (`err_src!`)                                  **
//! ****************************************************************************************
//!
//! # Overview
//!
//! This module defines the unified, `miette`-based diagnostic system for the harness. Every
//! failure the harness can report, from a missing fixture to a stale exemption, is a variant
//! of [`HarnessError`]. Errors that point into a fixture file carry an [`ErrorContext`] with
//! the fixture source and the span of the offending line, so `miette` can render a snippet.
//!
//! # Error Construction Macros
//!
//! - **Use `err_src!` for fixture errors with a pre-built `NamedSource`.**
//!   - `err_src!(MalformedFixture, "missing `<<<`", &source, span)`
//!   - `err_src!(MalformedAnnotation, "bad indent", &source, span, "use `(indent N)`")`
//!
//! # Rules
//!
//! - **Never pass a `usize` as a span.** Always construct a [`Span`].
//! - **Do not wrap sources by hand.** Use [`to_error_source`] once per fixture and pass the
//!   `Arc` by reference; the macro clones it.
//!
//! ****************************************************************************************

use std::path::PathBuf;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

pub type SourceArc = Arc<NamedSource<String>>;

/// A half-open byte range into a fixture's source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Type-safe error classification enum that corresponds to HarnessError variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Neither fixture kind exists for a logical test name
    FixtureMissing,
    /// A fixture ended before a required delimiter
    MalformedFixture,
    /// An `(indent N)` annotation could not be read
    MalformedAnnotation,
    /// One or more cases produced output different from expected
    FormatMismatch,
    /// An exempted case now produces the expected output
    StaleExemption,
    /// Reading a fixture or manifest failed
    Io,
    /// The suite manifest is invalid
    Config,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::FixtureMissing => "FixtureMissing",
            ErrorType::MalformedFixture => "MalformedFixture",
            ErrorType::MalformedAnnotation => "MalformedAnnotation",
            ErrorType::FormatMismatch => "FormatMismatch",
            ErrorType::StaleExemption => "StaleExemption",
            ErrorType::Io => "Io",
            ErrorType::Config => "Config",
        }
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The fixture source this error points into (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: SourceArc, span: Span) -> Self {
        Self {
            source: Some(source),
            span: Some(span),
            help: None,
        }
    }
}

/// Unified error type for every harness failure mode.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("No test data for {name} in {}", dir.display())]
    FixtureMissing { name: String, dir: PathBuf },

    #[error("Malformed fixture: {message}")]
    MalformedFixture { message: String, ctx: ErrorContext },

    #[error("Malformed indent annotation: {message}")]
    MalformedAnnotation { message: String, ctx: ErrorContext },

    #[error("{count} case(s) in {group} did not produce the expected output")]
    FormatMismatch {
        group: String,
        count: usize,
        ids: Vec<String>,
        expected: String,
        actual: String,
    },

    #[error("The test passed, but was expected to fail: {id}")]
    StaleExemption { id: String },

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest {}: {message}", path.display())]
    Config {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl HarnessError {
    fn get_ctx(&self) -> Option<&ErrorContext> {
        match self {
            HarnessError::MalformedFixture { ctx, .. } => Some(ctx),
            HarnessError::MalformedAnnotation { ctx, .. } => Some(ctx),
            _ => None,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            HarnessError::FixtureMissing { .. } => ErrorType::FixtureMissing,
            HarnessError::MalformedFixture { .. } => ErrorType::MalformedFixture,
            HarnessError::MalformedAnnotation { .. } => ErrorType::MalformedAnnotation,
            HarnessError::FormatMismatch { .. } => ErrorType::FormatMismatch,
            HarnessError::StaleExemption { .. } => ErrorType::StaleExemption,
            HarnessError::Io { .. } => ErrorType::Io,
            HarnessError::Config { .. } => ErrorType::Config,
        }
    }

    /// Errors that end the whole suite run instead of failing one group.
    pub fn is_suite_fatal(&self) -> bool {
        matches!(self, HarnessError::StaleExemption { .. })
    }
}

impl Diagnostic for HarnessError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        let code = match self.error_type() {
            ErrorType::FixtureMissing => "fmtspec::fixture_missing",
            ErrorType::MalformedFixture => "fmtspec::malformed_fixture",
            ErrorType::MalformedAnnotation => "fmtspec::malformed_annotation",
            ErrorType::FormatMismatch => "fmtspec::format_mismatch",
            ErrorType::StaleExemption => "fmtspec::stale_exemption",
            ErrorType::Io => "fmtspec::io",
            ErrorType::Config => "fmtspec::config",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        if let Some(help) = self.get_ctx().and_then(|ctx| ctx.help.as_ref()) {
            return Some(Box::new(help));
        }
        let help = match self {
            HarnessError::FixtureMissing { .. } => {
                "expected a `.stmt` or `.unit` file named after the group"
            }
            HarnessError::StaleExemption { .. } => {
                "the formatter was fixed; remove this id from `known_failures`"
            }
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.get_ctx()
            .and_then(|ctx| ctx.source.as_ref())
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let ctx = self.get_ctx()?;
        let span = ctx.span?;
        let text = match self {
            HarnessError::MalformedFixture { message, .. } => message.clone(),
            HarnessError::MalformedAnnotation { message, .. } => message.clone(),
            _ => return None,
        };
        let len = if span.end > span.start {
            span.end - span.start
        } else {
            1
        };
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(text),
            span.start,
            len,
        ))))
    }
}

/// Wraps a fixture's text into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source(name: impl AsRef<str>, source: impl Into<String>) -> SourceArc {
    Arc::new(NamedSource::new(name, source.into()))
}

/// Constructs a fixture-level HarnessError variant with a pre-built `NamedSource`.
#[macro_export]
macro_rules! err_src {
    // Message, pre-built source, span, help
    ($variant:ident, $msg:expr, $source:expr, $span:expr, $help:expr) => {
        $crate::HarnessError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext {
                source: Some(std::sync::Arc::clone($source)),
                span: Some($span),
                help: Some(format!("{}", $help)),
            },
        }
    };
    // Message, pre-built source, span
    ($variant:ident, $msg:expr, $source:expr, $span:expr) => {
        $crate::HarnessError::$variant {
            message: $msg.to_string(),
            ctx: $crate::ErrorContext::with_source_and_span(std::sync::Arc::clone($source), $span),
        }
    };
}

#[cfg(test)]
mod diagnostics_tests {
    use miette::Report;

    use super::*;

    #[test]
    fn test_fixture_error_renders_label_and_help() {
        let src = to_error_source("comments/classes.unit", "class A {}\n<<<\n");
        let err = err_src!(
            MalformedFixture,
            "case has no `<<<` delimiter",
            &src,
            Span { start: 0, end: 10 },
            "add a `<<<` line after the input"
        );
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("case has no `<<<` delimiter"));
        assert!(output.contains("add a `<<<` line after the input"));
        assert!(output.contains("comments/classes.unit"));
    }

    #[test]
    fn test_stale_exemption_has_default_help() {
        let err = HarnessError::StaleExemption {
            id: "comments/classes.unit:39  inline block comment".to_string(),
        };
        assert_eq!(err.error_type(), ErrorType::StaleExemption);
        assert!(err.is_suite_fatal());
        let output = format!("{:?}", Report::new(err));
        assert!(output.contains("known_failures"));
        assert!(output.contains("inline block comment"));
    }

    #[test]
    fn test_empty_span_still_gets_a_label() {
        let src = to_error_source("x.stmt", "");
        let err = err_src!(MalformedAnnotation, "bad", &src, Span { start: 0, end: 0 });
        let labels: Vec<_> = err.labels().map(|l| l.collect()).unwrap_or_default();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].len(), 1);
        assert!(!err.is_suite_fatal());
    }
}

use tracing::{debug, info, warn};

use crate::fixture::Case;
use crate::formatter::{FormatSettings, Formatter};
use crate::registry::KnownFailures;
use crate::report::FileReport;
use crate::selection::{extract_selection, mark};
use crate::HarnessError;

/// A case whose output differed from its expected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub id: String,
    pub expected: String,
    pub actual: String,
}

/// What running one case produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseOutcome {
    Passed,
    /// An exempted case diverged, which is its accepted state.
    KnownFailure { id: String },
    Mismatch(Mismatch),
}

/// Runs cases against a formatter, applying the known-failure registry.
pub struct CaseRunner<'a, F: Formatter + ?Sized> {
    formatter: &'a F,
    known_failures: &'a KnownFailures,
}

impl<'a, F: Formatter + ?Sized> CaseRunner<'a, F> {
    pub fn new(formatter: &'a F, known_failures: &'a KnownFailures) -> Self {
        Self {
            formatter,
            known_failures,
        }
    }

    pub fn settings(case: &Case) -> FormatSettings {
        FormatSettings::for_margin(case.page_width)
    }

    /// Formats one case and classifies the result.
    ///
    /// Returns `StaleExemption` when an exempted case produces its expected output.
    pub fn run(&self, case: &Case) -> Result<CaseOutcome, HarnessError> {
        let input = extract_selection(&case.input);
        let expected = extract_selection(&case.expected);
        let settings = Self::settings(case);

        let result = self.formatter.format_selection(
            &input.text,
            case.is_whole_program(),
            &settings,
            input.selection,
        );
        let (expected_text, actual_text) = match result {
            Ok(formatted) => match formatted.selection {
                Some(selection) if expected.has_markers => (
                    mark(&expected.text, expected.selection),
                    mark(&formatted.text, selection),
                ),
                _ => (expected.text, formatted.text),
            },
            Err(failure) => (expected.text, format!("<format failure: {}>\n", failure)),
        };

        let exempt = self.known_failures.contains(&case.id);
        if expected_text == actual_text {
            if exempt {
                warn!(case = %case.id, "known failure now passes");
                return Err(HarnessError::StaleExemption {
                    id: case.id.clone(),
                });
            }
            debug!(case = %case.id, "TEST PASSED");
            return Ok(CaseOutcome::Passed);
        }
        if exempt {
            debug!(case = %case.id, "known failure still fails");
            return Ok(CaseOutcome::KnownFailure {
                id: case.id.clone(),
            });
        }
        info!(case = %case.id, right_margin = settings.right_margin, "output mismatch");
        Ok(CaseOutcome::Mismatch(Mismatch {
            id: case.id.clone(),
            expected: expected_text,
            actual: actual_text,
        }))
    }

    /// Runs every case of one fixture file in order, aggregating mismatches.
    ///
    /// A stale exemption aborts the file and discards what was gathered so far.
    pub fn run_file(&self, label: &str, cases: &[Case]) -> Result<FileReport, HarnessError> {
        let mut report = FileReport::new(label);
        for case in cases {
            report.record(self.run(case)?);
        }
        Ok(report)
    }
}

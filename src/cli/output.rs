//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for pretty-printing, colorizing output,
//! rendering the combined diff of a failing group, and generating JSON.
//! Every function writes to a `WriteColor` so tests can capture the output.

use std::io::{self, Write};

use difference::{Changeset, Difference};
use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, WriteColor};

use crate::fixture::{Case, FixtureFile};
use crate::report::GroupReport;
use crate::suite::{GroupOutcome, GroupSpec, SuiteSummary};
use crate::HarnessError;

// ============================================================================
// COLOR SELECTION
// ============================================================================

/// Colors on a terminal unless disabled.
pub fn color_choice(no_color: bool) -> ColorChoice {
    if no_color || !atty::is(atty::Stream::Stdout) {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    }
}

fn with_color<W: WriteColor>(
    out: &mut W,
    color: Color,
    bold: bool,
    text: &str,
) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold))?;
    write!(out, "{}", text)?;
    out.reset()
}

// ============================================================================
// SUITE RESULTS
// ============================================================================

/// Prints one group's verdict, and for a failing group every offending case and the diff.
pub fn print_group<W: WriteColor>(out: &mut W, outcome: &GroupOutcome) -> io::Result<()> {
    let GroupSpec { name, dir } = &outcome.group;
    let Some(error) = &outcome.error else {
        let (passed, known) = outcome
            .report
            .as_ref()
            .map_or((0, 0), |r| (r.passed(), r.known_failures()));
        with_color(out, Color::Green, true, "PASS")?;
        return writeln!(
            out,
            ": {} [{}] ({} passed, {} known failures)",
            name, dir, passed, known
        );
    };

    with_color(out, Color::Red, true, "FAIL")?;
    writeln!(out, ": {} [{}]", name, dir)?;
    writeln!(out, "  Error: {}", error)?;
    if let HarnessError::FormatMismatch {
        ids,
        expected,
        actual,
        ..
    } = error
    {
        for id in ids {
            writeln!(out, "  - {}", id)?;
        }
        print_combined_diff(out, expected, actual)?;
    }
    Ok(())
}

/// Prints a line diff of the combined expected and actual buffers.
pub fn print_combined_diff<W: WriteColor>(
    out: &mut W,
    expected: &str,
    actual: &str,
) -> io::Result<()> {
    let changeset = Changeset::new(expected, actual, "\n");
    writeln!(out, "  Diff (-expected +actual):")?;
    print_diff(out, &changeset.diffs)
}

/// Prints the closing summary line.
pub fn print_summary<W: WriteColor>(out: &mut W, summary: &SuiteSummary) -> io::Result<()> {
    writeln!(out)?;
    write!(out, "Test summary: {} groups, ", summary.groups.len())?;
    with_color(out, Color::Green, false, "passed")?;
    write!(out, " {}, ", summary.passed_groups())?;
    with_color(out, Color::Red, false, "failed")?;
    write!(out, " {}; cases: {} passed, ", summary.failed_groups(), summary.passed_cases())?;
    with_color(out, Color::Yellow, false, "known failures")?;
    writeln!(
        out,
        " {}, mismatched {}",
        summary.known_failures(),
        summary.mismatched_cases()
    )
}

#[derive(Serialize)]
struct GroupRecord<'a> {
    group: &'a str,
    dir: &'a str,
    passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    report: Option<&'a GroupReport>,
}

#[derive(Serialize)]
struct SummaryRecord<'a> {
    passed_groups: usize,
    failed_groups: usize,
    passed_cases: usize,
    known_failures: usize,
    mismatched_cases: usize,
    groups: Vec<GroupRecord<'a>>,
}

/// Renders the summary as a JSON document.
pub fn summary_json(summary: &SuiteSummary) -> serde_json::Value {
    let record = SummaryRecord {
        passed_groups: summary.passed_groups(),
        failed_groups: summary.failed_groups(),
        passed_cases: summary.passed_cases(),
        known_failures: summary.known_failures(),
        mismatched_cases: summary.mismatched_cases(),
        groups: summary
            .groups
            .iter()
            .map(|g| GroupRecord {
                group: &g.group.name,
                dir: &g.group.dir,
                passed: g.passed(),
                error_kind: g.error.as_ref().map(|e| e.error_type().as_str()),
                error: g.error.as_ref().map(ToString::to_string),
                report: g.report.as_ref(),
            })
            .collect(),
    };
    serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
}

// ============================================================================
// INSPECTION COMMANDS
// ============================================================================

/// Prints the group table with the files each group resolves to.
pub fn print_group_table<W: WriteColor>(
    out: &mut W,
    rows: &[(GroupSpec, Result<Vec<FixtureFile>, HarnessError>)],
) -> io::Result<()> {
    for (group, files) in rows {
        write!(out, "{:<24} {:<20} ", group.name, group.dir)?;
        match files {
            Ok(files) => {
                let labels: Vec<&str> = files.iter().map(|f| f.label.as_str()).collect();
                writeln!(out, "{}", labels.join(", "))?;
            }
            Err(e) => {
                with_color(out, Color::Red, false, &e.to_string())?;
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

/// Prints fixture files under the root that no group runs.
pub fn print_uncovered<W: WriteColor>(out: &mut W, labels: &[String]) -> io::Result<()> {
    if labels.is_empty() {
        return Ok(());
    }
    writeln!(out)?;
    with_color(out, Color::Yellow, true, "Not covered by any group:")?;
    writeln!(out)?;
    for label in labels {
        writeln!(out, "  {}", label)?;
    }
    Ok(())
}

/// Prints the cases parsed from one fixture.
pub fn print_cases<W: WriteColor>(out: &mut W, cases: &[Case]) -> io::Result<()> {
    for case in cases {
        with_color(out, Color::Cyan, true, &case.id)?;
        writeln!(
            out,
            "\n  margin {}, indent {}, {} input lines, {} expected lines",
            case.page_width,
            case.leading_indent,
            case.input.lines().count(),
            case.expected.lines().count()
        )?;
    }
    writeln!(out, "{} case(s)", cases.len())
}

// ============================================================================
// PRIVATE HELPERS
// ============================================================================

fn print_diff<W: WriteColor>(out: &mut W, diffs: &[Difference]) -> io::Result<()> {
    for diff in diffs {
        let (prefix, color, text) = match diff {
            Difference::Same(x) => (' ', None, x),
            Difference::Add(x) => ('+', Some(Color::Green), x),
            Difference::Rem(x) => ('-', Some(Color::Red), x),
        };
        match color {
            Some(color) => out.set_color(ColorSpec::new().set_fg(Some(color)))?,
            None => out.reset()?,
        }
        for line in text.split('\n') {
            writeln!(out, "  {}{}", prefix, line)?;
        }
    }
    out.reset()
}

#[cfg(test)]
mod tests {
    use termcolor::Buffer;

    use super::*;
    use crate::report::FileReport;
    use crate::runner::{CaseOutcome, Mismatch};

    fn failing_outcome() -> GroupOutcome {
        let mut file = FileReport::new("d/a.unit");
        file.record(CaseOutcome::Mismatch(Mismatch {
            id: "d/a.unit:1  wraps".to_string(),
            expected: "f(a,\n    b);\n".to_string(),
            actual: "f(a, b);\n".to_string(),
        }));
        let mut report = GroupReport::new("a");
        report.push(file);
        let error = report.assert_clean().err();
        GroupOutcome {
            group: GroupSpec::new("a", "d"),
            report: Some(report),
            error,
        }
    }

    #[test]
    fn test_failing_group_lists_cases_and_diff() {
        let mut buf = Buffer::no_color();
        print_group(&mut buf, &failing_outcome()).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.starts_with("FAIL: a [d]"));
        assert!(text.contains("  - d/a.unit:1  wraps"));
        assert!(text.contains("  -f(a,"));
        assert!(text.contains("  +f(a, b);"));
    }

    #[test]
    fn test_aborted_group_prints_error_without_diff() {
        let outcome = GroupOutcome {
            group: GroupSpec::new("absent", "d"),
            report: None,
            error: Some(HarnessError::FixtureMissing {
                name: "absent".to_string(),
                dir: "fixtures/d".into(),
            }),
        };
        let mut buf = Buffer::no_color();
        print_group(&mut buf, &outcome).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.starts_with("FAIL: absent [d]\n"));
        assert!(text.contains("  Error: No test data for absent"));
        assert!(!text.contains("Diff"));
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = SuiteSummary {
            groups: vec![failing_outcome()],
        };
        let json = summary_json(&summary);
        assert_eq!(json["failed_groups"], 1);
        assert_eq!(json["mismatched_cases"], 1);
        assert_eq!(json["groups"][0]["error_kind"], "FormatMismatch");
        assert_eq!(
            json["groups"][0]["report"]["files"][0]["mismatches"][0],
            "d/a.unit:1  wraps"
        );
    }

    #[test]
    fn test_print_summary_counts() {
        let summary = SuiteSummary {
            groups: vec![failing_outcome()],
        };
        let mut buf = Buffer::no_color();
        print_summary(&mut buf, &summary).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("1 groups, passed 0, failed 1"));
        assert!(text.contains("mismatched 1"));
    }
}

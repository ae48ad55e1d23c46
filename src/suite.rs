//! The data-driven group table and the runner that walks it.
//!
//! # Manifest
//!
//! ```yaml
//! root: tests/dart_style          # fixture root, relative to the manifest
//! groups:
//!   - name: classes               # logical test name
//!     dir: comments               # directory under root
//!   - name: classes2              # trailing digit dropped: splitting/classes.*
//!     dir: splitting
//! known_failures:
//!   - "comments/classes.unit:110  remove blank line before beginning of body"
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use fmtspec::formatter::CommandFormatter;
//! use fmtspec::suite::Suite;
//!
//! let suite = Suite::load("fmtspec.yaml")?;
//! let formatter = CommandFormatter::new("dart", vec!["format".into()]);
//! let summary = suite.run(&formatter, None)?;
//! if summary.has_failures() {
//!     std::process::exit(1);
//! }
//! # Ok::<(), fmtspec::HarnessError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::fixture::{locate, FixtureFile};
use crate::formatter::Formatter;
use crate::registry::KnownFailures;
use crate::report::GroupReport;
use crate::runner::CaseRunner;
use crate::HarnessError;

/// One row of the group table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSpec {
    pub name: String,
    pub dir: String,
}

impl GroupSpec {
    pub fn new(name: impl Into<String>, dir: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dir: dir.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    #[serde(default = "default_root")]
    root: PathBuf,
    groups: Vec<GroupSpec>,
    #[serde(default)]
    known_failures: Vec<String>,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// The group table, fixture root and known failures for one run.
#[derive(Debug, Clone)]
pub struct Suite {
    root: PathBuf,
    groups: Vec<GroupSpec>,
    known_failures: KnownFailures,
}

impl Suite {
    pub fn new(root: impl Into<PathBuf>, groups: Vec<GroupSpec>, known_failures: KnownFailures) -> Self {
        Self {
            root: root.into(),
            groups,
            known_failures,
        }
    }

    /// Loads a manifest; a relative `root` is resolved against the manifest's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HarnessError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| HarnessError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_yaml(&text, base).map_err(|e| match e {
            HarnessError::Config {
                message, source, ..
            } => HarnessError::Config {
                path: path.to_path_buf(),
                message,
                source,
            },
            other => other,
        })
    }

    pub fn from_yaml(text: &str, base: &Path) -> Result<Self, HarnessError> {
        let manifest: Manifest = serde_yaml::from_str(text).map_err(|e| HarnessError::Config {
            path: base.to_path_buf(),
            message: e.to_string(),
            source: Some(Box::new(e)),
        })?;
        if let Some(dup) = first_duplicate(&manifest.groups) {
            return Err(HarnessError::Config {
                path: base.to_path_buf(),
                message: format!("group `{}` is listed more than once", dup),
                source: None,
            });
        }
        Ok(Self::new(
            base.join(manifest.root),
            manifest.groups,
            KnownFailures::new(manifest.known_failures),
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    pub fn known_failures(&self) -> &KnownFailures {
        &self.known_failures
    }

    /// Groups whose name contains `filter`, case-insensitively; all groups without one.
    pub fn selected<'s>(&'s self, filter: Option<&'s str>) -> impl Iterator<Item = &'s GroupSpec> {
        let filter = filter.map(str::to_lowercase);
        self.groups.iter().filter(move |group| match &filter {
            Some(f) => group.name.to_lowercase().contains(f.as_str()),
            None => true,
        })
    }

    pub fn locate(&self, group: &GroupSpec) -> Result<Vec<FixtureFile>, HarnessError> {
        locate(&self.root, &group.dir, &group.name)
    }

    /// Runs every fixture file of one group and aggregates the outcomes.
    pub fn run_group<F: Formatter + ?Sized>(
        &self,
        group: &GroupSpec,
        formatter: &F,
    ) -> Result<GroupReport, HarnessError> {
        let runner = CaseRunner::new(formatter, &self.known_failures);
        let mut report = GroupReport::new(&group.name);
        for file in self.locate(group)? {
            let cases = file.load()?;
            info!(
                fixture = %file.label,
                cases = cases.len(),
                right_margin = ?cases.first().map(|c| c.page_width),
                "running fixture"
            );
            report.push(runner.run_file(&file.label, &cases)?);
        }
        Ok(report)
    }

    /// Runs the selected groups in table order.
    ///
    /// A group error fails that group and the run moves on, except a stale exemption,
    /// which ends the whole run.
    pub fn run<F: Formatter + ?Sized>(
        &self,
        formatter: &F,
        filter: Option<&str>,
    ) -> Result<SuiteSummary, HarnessError> {
        let mut summary = SuiteSummary::default();
        for group in self.selected(filter) {
            let outcome = match self.run_group(group, formatter) {
                Ok(report) => {
                    let error = report.assert_clean().err();
                    GroupOutcome {
                        group: group.clone(),
                        report: Some(report),
                        error,
                    }
                }
                Err(e) if e.is_suite_fatal() => return Err(e),
                Err(e) => {
                    warn!(group = %group.name, error = %e, "group aborted");
                    GroupOutcome {
                        group: group.clone(),
                        report: None,
                        error: Some(e),
                    }
                }
            };
            summary.groups.push(outcome);
        }
        Ok(summary)
    }
}

fn first_duplicate(groups: &[GroupSpec]) -> Option<&str> {
    let mut seen = std::collections::HashSet::new();
    groups
        .iter()
        .find(|g| !seen.insert(g.name.as_str()))
        .map(|g| g.name.as_str())
}

/// Result of running one group.
#[derive(Debug)]
pub struct GroupOutcome {
    pub group: GroupSpec,
    /// Absent when the group aborted before its assertion.
    pub report: Option<GroupReport>,
    pub error: Option<HarnessError>,
}

impl GroupOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Results of a suite run, in table order.
#[derive(Debug, Default)]
pub struct SuiteSummary {
    pub groups: Vec<GroupOutcome>,
}

impl SuiteSummary {
    pub fn passed_groups(&self) -> usize {
        self.groups.iter().filter(|g| g.passed()).count()
    }

    pub fn failed_groups(&self) -> usize {
        self.groups.len() - self.passed_groups()
    }

    pub fn has_failures(&self) -> bool {
        self.failed_groups() > 0
    }

    pub fn passed_cases(&self) -> usize {
        self.reports().map(GroupReport::passed).sum()
    }

    pub fn known_failures(&self) -> usize {
        self.reports().map(GroupReport::known_failures).sum()
    }

    pub fn mismatched_cases(&self) -> usize {
        self.reports().map(|r| r.mismatch_ids().len()).sum()
    }

    fn reports(&self) -> impl Iterator<Item = &GroupReport> {
        self.groups.iter().filter_map(|g| g.report.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_parses_with_defaults() {
        let suite = Suite::from_yaml(
            "groups:\n  - { name: classes, dir: comments }\n",
            Path::new("/fixtures"),
        )
        .unwrap();
        assert_eq!(suite.root(), Path::new("/fixtures/."));
        assert_eq!(suite.groups(), &[GroupSpec::new("classes", "comments")]);
        assert!(suite.known_failures().is_empty());
    }

    #[test]
    fn test_manifest_rejects_duplicates_and_unknown_fields() {
        let dup = "groups:\n  - { name: a, dir: x }\n  - { name: a, dir: y }\n";
        let err = Suite::from_yaml(dup, Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let unknown = "groups: []\nknown_failure: []\n";
        assert!(Suite::from_yaml(unknown, Path::new(".")).is_err());
    }

    #[test]
    fn test_filter_is_case_insensitive() {
        let suite = Suite::new(
            ".",
            vec![
                GroupSpec::new("classes", "comments"),
                GroupSpec::new("Classes2", "splitting"),
                GroupSpec::new("loops", "splitting"),
            ],
            KnownFailures::empty(),
        );
        let names: Vec<_> = suite.selected(Some("CLASS")).map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["classes", "Classes2"]);
        assert_eq!(suite.selected(None).count(), 3);
    }
}

//! Aggregation of case outcomes.
//!
//! A mismatch does not stop a run. Each one is appended to two parallel buffers, the
//! expected text and the actual text, each entry headed by its case id. The buffers for
//! a whole group are compared exactly once at the end, so a failing group reports every
//! divergent case in one diff.

use serde::Serialize;

use crate::runner::{CaseOutcome, Mismatch};
use crate::HarnessError;

/// Outcomes of every case in one fixture file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub label: String,
    pub passed: usize,
    pub known_failures: usize,
    mismatches: Vec<String>,
    #[serde(skip)]
    expected: String,
    #[serde(skip)]
    actual: String,
}

impl FileReport {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn record(&mut self, outcome: CaseOutcome) {
        match outcome {
            CaseOutcome::Passed => self.passed += 1,
            CaseOutcome::KnownFailure { .. } => self.known_failures += 1,
            CaseOutcome::Mismatch(mismatch) => self.push_mismatch(mismatch),
        }
    }

    fn push_mismatch(&mut self, mismatch: Mismatch) {
        let Mismatch {
            id,
            expected,
            actual,
        } = mismatch;
        self.expected.push_str(&entry(&id, &expected));
        self.actual.push_str(&entry(&id, &actual));
        self.mismatches.push(id);
    }

    pub fn mismatch_ids(&self) -> Vec<&str> {
        self.mismatches.iter().map(String::as_str).collect()
    }

    pub fn cases(&self) -> usize {
        self.passed + self.known_failures + self.mismatches.len()
    }

    /// Combined expected text of every mismatch.
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Combined actual text of every mismatch.
    pub fn actual(&self) -> &str {
        &self.actual
    }
}

fn entry(id: &str, text: &str) -> String {
    format!("TEST: {}\n{}\n", id, text)
}

/// The file reports of one logical test name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupReport {
    pub name: String,
    pub files: Vec<FileReport>,
}

impl GroupReport {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
        }
    }

    pub fn push(&mut self, file: FileReport) {
        self.files.push(file);
    }

    pub fn passed(&self) -> usize {
        self.files.iter().map(|f| f.passed).sum()
    }

    pub fn known_failures(&self) -> usize {
        self.files.iter().map(|f| f.known_failures).sum()
    }

    pub fn mismatch_ids(&self) -> Vec<&str> {
        self.files.iter().flat_map(FileReport::mismatch_ids).collect()
    }

    pub fn combined_expected(&self) -> String {
        self.files.iter().map(FileReport::expected).collect()
    }

    pub fn combined_actual(&self) -> String {
        self.files.iter().map(FileReport::actual).collect()
    }

    /// The single assertion for the group: both combined buffers must be equal.
    pub fn assert_clean(&self) -> Result<(), HarnessError> {
        let expected = self.combined_expected();
        let actual = self.combined_actual();
        if expected == actual {
            return Ok(());
        }
        let ids: Vec<String> = self.mismatch_ids().into_iter().map(String::from).collect();
        Err(HarnessError::FormatMismatch {
            group: self.name.clone(),
            count: ids.len(),
            ids,
            expected,
            actual,
        })
    }
}

//! # Shared Test Helpers
//!
//! Builds throwaway fixture trees on disk and provides in-process formatters.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use fmtspec::formatter::{FormatFailure, FormatSettings};
use tempfile::TempDir;

/// A fixture root in a temporary directory, removed on drop.
pub struct FixtureTree {
    dir: TempDir,
}

impl FixtureTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Writes `text` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, text: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create fixture dir");
        }
        fs::write(&path, text).expect("write fixture");
        path
    }
}

/// Returns its input unchanged.
pub fn identity(source: &str, _: bool, _: &FormatSettings) -> Result<String, FormatFailure> {
    Ok(source.to_string())
}

/// Strips trailing whitespace from every line.
pub fn trim_trailing(source: &str, _: bool, _: &FormatSettings) -> Result<String, FormatFailure> {
    Ok(source
        .lines()
        .map(|line| format!("{}\n", line.trim_end()))
        .collect())
}

/// Path of the checked-in sample fixtures.
pub fn sample_fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

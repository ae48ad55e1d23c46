//! Fixture files and the cases they encode.
//!
//! A fixture is a plain-text file holding one or more input/expected pairs for the
//! formatter under test. Two kinds exist, told apart by extension:
//!
//! - `.unit` files hold whole programs and are formatted as-is.
//! - `.stmt` files hold fragments (statements, expressions) and are wrapped in a
//!   synthetic `m() { ... }` function before formatting.
//!
//! See [`parser`] for the grammar, [`locator`] for how a group name resolves to files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::HarnessError;

pub mod annotation;
pub mod locator;
pub mod parser;

pub use annotation::{parse_indent, IndentAnnotation};
pub use locator::{discover_fixture_files, locate, logical_name};
pub use parser::parse_fixture;

/// Page width used when a fixture does not declare one on its first line.
pub const DEFAULT_PAGE_WIDTH: usize = 80;

/// Which of the two recognized fixture kinds a file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FixtureKind {
    /// `.stmt`: wrapped in a synthetic function before formatting.
    Fragment,
    /// `.unit`: formatted as a complete compilation unit.
    WholeProgram,
}

impl FixtureKind {
    /// Probe order used by the locator.
    pub const ALL: [FixtureKind; 2] = [FixtureKind::Fragment, FixtureKind::WholeProgram];

    pub fn extension(&self) -> &'static str {
        match self {
            FixtureKind::Fragment => "stmt",
            FixtureKind::WholeProgram => "unit",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "stmt" => Some(FixtureKind::Fragment),
            "unit" => Some(FixtureKind::WholeProgram),
            _ => None,
        }
    }

    pub fn is_whole_program(&self) -> bool {
        matches!(self, FixtureKind::WholeProgram)
    }
}

/// One input/expected pair plus the settings derived from its fixture context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Case {
    /// Report and exemption key: `<dir>/<file>:<line> <header>`.
    pub id: String,
    /// The header text with `>>>` removed.
    pub description: String,
    /// 1-based line number of the header.
    pub line: usize,
    pub kind: FixtureKind,
    /// Right margin handed to the formatter.
    pub page_width: usize,
    pub leading_indent: usize,
    /// Formatter input, selection markers included.
    pub input: String,
    /// Expected output, selection markers included.
    pub expected: String,
}

impl Case {
    pub fn is_whole_program(&self) -> bool {
        self.kind.is_whole_program()
    }
}

/// A fixture file that exists on disk, as resolved by the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureFile {
    pub path: PathBuf,
    pub kind: FixtureKind,
    /// `<dir>/<file name>`, the prefix of every case id in this file.
    pub label: String,
}

impl FixtureFile {
    /// Reads the file and parses it into cases.
    pub fn load(&self) -> Result<Vec<Case>, HarnessError> {
        let text = fs::read_to_string(&self.path).map_err(|source| HarnessError::Io {
            path: self.path.clone(),
            source,
        })?;
        parse_fixture(&self.label, self.kind, &text)
    }
}

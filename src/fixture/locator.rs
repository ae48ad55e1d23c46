//! Resolves logical test names to fixture files.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::fixture::{FixtureFile, FixtureKind};
use crate::HarnessError;

/// Maps a group name to the file stem it tests.
///
/// Names such as `classes2` or `expressions3` exist only to keep group names unique
/// across directories: a name that starts with a letter and ends with a digit loses
/// that one trailing digit. Purely numeric names (`0025`) are left alone.
pub fn logical_name(name: &str) -> &str {
    let starts_with_letter = name.chars().next().is_some_and(char::is_alphabetic);
    match name.char_indices().next_back() {
        Some((at, last)) if starts_with_letter && last.is_ascii_digit() => &name[..at],
        _ => name,
    }
}

/// Finds the fixture files for `name` in `root/dir`, fragment kind first.
///
/// Each kind that exists is returned; only the absence of both is an error.
pub fn locate(root: &Path, dir: &str, name: &str) -> Result<Vec<FixtureFile>, HarnessError> {
    let stem = logical_name(name);
    let directory = root.join(dir);
    let files: Vec<FixtureFile> = FixtureKind::ALL
        .iter()
        .filter_map(|&kind| {
            let file_name = format!("{}.{}", stem, kind.extension());
            let path = directory.join(&file_name);
            path.is_file().then(|| FixtureFile {
                path,
                kind,
                label: format!("{}/{}", dir, file_name),
            })
        })
        .collect();

    if files.is_empty() {
        return Err(HarnessError::FixtureMissing {
            name: stem.to_string(),
            dir: directory,
        });
    }
    debug!(group = name, files = files.len(), "located fixtures");
    Ok(files)
}

/// Recursively scans a directory for `.stmt` and `.unit` files.
///
/// The returned list of files is sorted to ensure deterministic order.
pub fn discover_fixture_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>, HarnessError> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| HarnessError::Io {
            path: e.path().unwrap_or(root).to_path_buf(),
            source: e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("directory walk failed")),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        if FixtureKind::from_path(entry.path()).is_none() {
            continue;
        }
        files.push(entry.path().to_path_buf());
    }
    files.sort();
    Ok(files)
}

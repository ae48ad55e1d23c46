//! The fmtspec Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{fs, process};

use clap::Parser;
use miette::{miette, IntoDiagnostic, Result};
use termcolor::StandardStream;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::args::{Command, FmtspecArgs};
use crate::fixture::{discover_fixture_files, parse_fixture, FixtureKind};
use crate::formatter::CommandFormatter;
use crate::suite::Suite;

pub mod args;
pub mod output;

/// Environment variable holding the log filter, e.g. `FMTSPEC_LOG=fmtspec=debug`.
pub const LOG_ENV: &str = "FMTSPEC_LOG";

/// The main entry point for the CLI.
pub fn run() {
    let args = FmtspecArgs::parse();
    init_logging();
    let mut stdout = StandardStream::stdout(output::color_choice(args.no_color));

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Run {
            manifest,
            filter,
            json,
            formatter,
        } => handle_run(&mut stdout, &manifest, filter.as_deref(), json, &formatter),
        Command::List { manifest } => handle_list(&mut stdout, &manifest),
        Command::Cases { file } => handle_cases(&mut stdout, &file),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(report) => {
            eprintln!("{:?}", report);
            process::exit(1);
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second initialization (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Handles the `run` subcommand. Returns whether every group passed.
fn handle_run(
    out: &mut StandardStream,
    manifest: &Path,
    filter: Option<&str>,
    json: bool,
    argv: &[String],
) -> Result<bool> {
    let suite = Suite::load(manifest)?;
    let formatter =
        CommandFormatter::from_argv(argv).ok_or_else(|| miette!("no formatter command given"))?;
    debug!(manifest = %manifest.display(), groups = suite.groups().len(), "loaded suite");

    let summary = suite.run(&formatter, filter)?;
    if summary.groups.is_empty() {
        if let Some(filter) = filter {
            return Err(miette!("no group matches `{}`", filter));
        }
    }

    if json {
        let text = serde_json::to_string_pretty(&output::summary_json(&summary)).into_diagnostic()?;
        println!("{}", text);
    } else {
        for outcome in &summary.groups {
            output::print_group(out, outcome).into_diagnostic()?;
        }
        output::print_summary(out, &summary).into_diagnostic()?;
    }
    Ok(!summary.has_failures())
}

/// Handles the `list` subcommand.
fn handle_list(out: &mut StandardStream, manifest: &Path) -> Result<bool> {
    let suite = Suite::load(manifest)?;
    let rows: Vec<_> = suite
        .groups()
        .iter()
        .map(|group| (group.clone(), suite.locate(group)))
        .collect();
    output::print_group_table(out, &rows).into_diagnostic()?;

    let covered: BTreeSet<PathBuf> = rows
        .iter()
        .filter_map(|(_, files)| files.as_ref().ok())
        .flatten()
        .map(|file| file.path.clone())
        .collect();
    let uncovered: Vec<String> = discover_fixture_files(suite.root())?
        .into_iter()
        .filter(|path| !covered.contains(path))
        .map(|path| relative_label(suite.root(), &path))
        .collect();
    output::print_uncovered(out, &uncovered).into_diagnostic()?;

    Ok(rows.iter().all(|(_, files)| files.is_ok()))
}

/// Handles the `cases` subcommand.
fn handle_cases(out: &mut StandardStream, file: &Path) -> Result<bool> {
    let kind = FixtureKind::from_path(file)
        .ok_or_else(|| miette!("`{}` is not a .stmt or .unit file", file.display()))?;
    let text = fs::read_to_string(file).into_diagnostic()?;
    let cases = parse_fixture(&fixture_label(file), kind, &text)?;
    output::print_cases(out, &cases).into_diagnostic()?;
    Ok(true)
}

/// `<parent dir name>/<file name>`, the label the suite would give the file.
fn fixture_label(file: &Path) -> String {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match file.parent().and_then(Path::file_name) {
        Some(dir) => format!("{}/{}", dir.to_string_lossy(), name),
        None => name,
    }
}

fn relative_label(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

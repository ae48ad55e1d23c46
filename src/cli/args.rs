//! Defines the command-line arguments and subcommands for the fmtspec CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "fmtspec",
    version,
    about = "Runs a source-code formatter against fixture files of expected output."
)]
pub struct FmtspecArgs {
    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run every group in the manifest against a formatter command.
    Run {
        /// Path to the suite manifest.
        #[arg(short, long, default_value = "fmtspec.yaml")]
        manifest: PathBuf,
        /// Run only groups whose name contains this text.
        #[arg(short, long)]
        filter: Option<String>,
        /// Print the summary as JSON instead of text.
        #[arg(long)]
        json: bool,
        /// The formatter command line; `{margin}` and `{kind}` are substituted per case.
        #[arg(required = true, last = true)]
        formatter: Vec<String>,
    },
    /// Show the group table and the fixture files each group resolves to.
    List {
        /// Path to the suite manifest.
        #[arg(short, long, default_value = "fmtspec.yaml")]
        manifest: PathBuf,
    },
    /// Parse one fixture file and print its cases.
    Cases {
        /// The `.stmt` or `.unit` file to parse.
        #[arg(required = true)]
        file: PathBuf,
    },
}

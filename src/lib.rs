pub use crate::diagnostics::{to_error_source, ErrorContext, ErrorType, HarnessError, Span};

pub mod cli;
pub mod diagnostics;
pub mod fixture;
pub mod formatter;
pub mod registry;
pub mod report;
pub mod runner;
pub mod selection;
pub mod suite;

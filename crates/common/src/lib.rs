//! Shared utilities for the medc Mediator compiler tools.

pub mod args;
pub mod formatter;

pub use args::{get_example_files, Args};
pub use formatter::BatchReport;

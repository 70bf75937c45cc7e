//! Output module for persisting records and reporting on a run
//!
//! This module handles:
//! - Appending records to CSV files, header first, one flush per append
//! - Reading a listing file back for the detail phase
//! - Collecting run statistics and printing the run summary

mod sink;
pub mod stats;

pub use sink::{destination_stem, read_listing_file, CsvSink};
pub use stats::{print_summary, RunStats, RunSummary};

use thiserror::Error;

/// Errors that can occur while writing or reading record files
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("No records to write")]
    EmptyInput,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

//! Error types for tabload-core

use crate::table::SignatureDiff;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tabload-core
#[derive(Debug, Error)]
pub enum Error {
    /// Root path is neither a regular file nor a directory
    #[error("path is neither a file nor a directory: '{}'", path.display())]
    Path { path: PathBuf },

    /// Directory contains no file with a supported extension
    #[error("no supported files (csv, xlsx, xls) found in '{}'", path.display())]
    NoFilesFound { path: PathBuf },

    /// File extension has no registered reader
    #[error("unsupported file format '{extension}' for '{}'", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Malformed tabular content
    #[error("failed to parse '{}': {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    /// Failed to read a file
    #[error("failed to read file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error from the csv crate
    #[error("CSV error in '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Workbook error from calamine
    #[error("spreadsheet error in '{}': {source}", path.display())]
    Excel {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    /// Column signature differs from the reference file
    #[error(
        "column mismatch between reference '{}' and '{}': {diff}",
        reference.display(),
        offending.display()
    )]
    ColumnMismatch {
        reference: PathBuf,
        offending: PathBuf,
        diff: SignatureDiff,
    },

    /// Every candidate failed to load
    #[error("no files could be loaded from '{}' ({failed} failed)", path.display())]
    NoDataLoaded { path: PathBuf, failed: usize },

    /// Unrecognized column consistency policy
    #[error("column consistency must be one of 'error', 'warning', 'ignore', got '{0}'")]
    InvalidConsistency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the failures that abort a report run.
///
/// Failures scoped to a single client never surface here; they are captured
/// as an error-status [`Record`](crate::model::Record) instead.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a CSV file cannot be read or written.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when the mapping, order, or client configuration is missing or
    /// malformed. Always fatal to the run.
    #[error("configuration error in {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Raised when a table does not follow the expected conventions.
    #[error("invalid table {path}: {reason}")]
    InvalidTable { path: PathBuf, reason: String },

    /// Raised when two tables that must share a layout do not.
    #[error("header mismatch: {left:?} vs {right:?}")]
    HeaderMismatch {
        left: Vec<String>,
        right: Vec<String>,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the command line combines options that cannot work together.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ReportError {
    /// Builds a [`ReportError::Config`] for the given source file.
    pub fn config(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        ReportError::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

//! Data source error types

use thiserror::Error;

/// Errors that can occur while a data source produces entries.
#[derive(Error, Debug)]
pub enum SourceError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV file could not be read
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record violates the entry contract (bad date, negative hours)
    #[error("malformed entry: {0}")]
    Malformed(String),
}

/// Result type alias for data source operations.
pub type SourceResult<T> = Result<T, SourceError>;

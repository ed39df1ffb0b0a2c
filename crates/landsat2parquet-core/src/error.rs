//! Error types for the scene splitter.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Errors that can occur while splitting the scene-metadata index
#[derive(Debug, Error)]
pub enum SplitError {
    /// Source or partition file could not be read or written
    #[error("scene index I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or empty CSV input; propagated, never retried
    #[error("malformed scene index: {0}")]
    Csv(#[from] ArrowError),

    /// Partition file could not be encoded
    #[error("failed to write partition: {0}")]
    Parquet(#[from] ParquetError),

    /// The index header lacks a column the splitter keys on
    #[error("scene index is missing required column '{name}'")]
    MissingColumn { name: &'static str },

    /// The source had no header row at all
    #[error("scene index is empty")]
    EmptyIndex,

    /// A zero chunk size would make no forward progress
    #[error("chunk size must be greater than 0")]
    InvalidChunkSize,
}

//! Error types for spacor

use thiserror::Error;

/// Main error type for spacor operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Weight matrix is not square: {rows}x{cols}")]
    NonSquareWeights { rows: usize, cols: usize },

    #[error("Size mismatch for {what}: expected {expected}, got {actual}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Label '{0}' not found")]
    LabelNotFound(String),

    #[error("Duplicate label '{0}'")]
    DuplicateLabel(String),

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for spacor operations
pub type Result<T> = std::result::Result<T, Error>;

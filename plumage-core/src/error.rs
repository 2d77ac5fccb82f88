//! Structured error types for the Plumage breeding engine.

use thiserror::Error;

/// Unified error type for all Plumage operations.
///
/// Biological data problems (unknown genotype strings, absent parents) never
/// surface here; they degrade to wild-type defaults. These variants cover
/// caller defects and malformed external tables.
#[derive(Debug, Error)]
pub enum PlumageError {
    /// I/O error while reading an external table from disk
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (a table or config document that fails to deserialize)
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid input (bad arguments, out-of-range values)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Inconsistent lookup table (duplicate keys, dangling locus references)
    #[error("table error: {0}")]
    Table(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the Plumage crates.
pub type Result<T> = std::result::Result<T, PlumageError>;

//! Error types for payout-recon

use thiserror::Error;

/// Main error type for payout-recon
///
/// Every variant is fatal to a report run: the pipeline performs no partial
/// recovery, callers correct the input and re-run.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Consistency check failed: {0}")]
    Consistency(String),

    #[error("Unreconciled transactions: {0}")]
    Unreconciled(String),

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

/// Result type alias for payout-recon operations
pub type Result<T> = std::result::Result<T, ReportError>;

//! Error types for the bond screener

use thiserror::Error;

/// Main error type for the bond screener
///
/// Per-bond computation faults (`MissingInput`, `InvalidHorizon`, `ArithmeticFault`)
/// are normally converted into an undefined field on that bond only; the variants
/// exist so the cause can be logged and tested.
#[derive(Error, Debug)]
pub enum BondError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid horizon for {secid}: {days} days remaining")]
    InvalidHorizon { secid: String, days: i64 },

    #[error("Arithmetic fault: {0}")]
    ArithmeticFault(String),

    #[error("Empty bond collection")]
    EmptyCollection,

    #[error("Failed to decode field '{field}': {reason}")]
    Decode { field: String, reason: String },

    #[error("Data error: {0}")]
    DataError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl BondError {
    /// True for faults that are contained to a single bond record
    pub fn is_record_fault(&self) -> bool {
        matches!(
            self,
            BondError::MissingInput(_)
                | BondError::InvalidHorizon { .. }
                | BondError::ArithmeticFault(_)
                | BondError::Decode { .. }
        )
    }
}

/// Result type alias for bond screener operations
pub type Result<T> = std::result::Result<T, BondError>;

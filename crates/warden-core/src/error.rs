//! Error types for the Warden core library

use thiserror::Error;

use crate::types::Amount;

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the core types and capability seams
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration rejected by validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Payout larger than the value currently held
    #[error("Insufficient held value: needed {needed}, available {available}")]
    InsufficientFunds { needed: Amount, available: Amount },

    /// Target refused a delivered call
    #[error("Call rejected by target: {0}")]
    CallRejected(String),

    /// Malformed hex identifier
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<hex::FromHexError> for Error {
    fn from(e: hex::FromHexError) -> Self {
        Error::InvalidIdentifier(e.to_string())
    }
}

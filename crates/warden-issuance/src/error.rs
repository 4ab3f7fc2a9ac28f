//! Error types for the issuance ledger and swap engine

use thiserror::Error;
use warden_core::{AccountId, Amount};

/// Result type alias for issuance operations
pub type Result<T> = std::result::Result<T, IssuanceError>;

/// Hard rejections raised by the ledger and the swap engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IssuanceError {
    /// Transfers are locked until the issuance cap is reached
    #[error("Transfers are locked until the issuance cap is reached")]
    TransferLocked,

    #[error("Insufficient balance for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        holder: AccountId,
        needed: Amount,
        available: Amount,
    },

    #[error("Insufficient allowance for {spender}: needed {needed}, available {available}")]
    InsufficientAllowance {
        spender: AccountId,
        needed: Amount,
        available: Amount,
    },

    /// Swap window has not been started
    #[error("Swap window not started")]
    NotStarted,

    #[error("Swap window already started")]
    AlreadyStarted,

    /// Deposit arrived after the window closed or was stopped
    #[error("Swap window closed")]
    WindowClosed,

    /// Emergency stop is active
    #[error("Swap halted by emergency stop")]
    EmergencyStop,

    /// Cap already reached; the swap is over
    #[error("Issuance cap reached")]
    CapReached,

    #[error("Bonus phase deposit {value} below minimum {minimum}")]
    BelowMinimum { value: Amount, minimum: Amount },

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,
}

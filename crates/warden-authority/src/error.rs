//! Error types for the authority

use thiserror::Error;

/// Result type alias for authority operations
pub type Result<T> = std::result::Result<T, AuthorityError>;

/// Hard rejections raised by the authority
///
/// Unauthorized or redundant calls are not errors; they come back as an
/// `Ignored` outcome.
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),

    /// Issuance ledger or swap engine error
    #[error("Issuance error: {0}")]
    Issuance(#[from] warden_issuance::IssuanceError),

    /// The authority was torn down
    #[error("Authority has been decommissioned")]
    Decommissioned,

    /// Deposits are refused while the emergency stop is active
    #[error("Emergency stop is active")]
    EmergencyStopActive,

    /// Teardown requires the emergency stop
    #[error("Teardown requires an active emergency stop")]
    EmergencyStopInactive,

    /// No swap engine installed yet
    #[error("Issuance ledger not configured")]
    IssuanceNotConfigured,

    #[error("Deposit of zero value")]
    ZeroDeposit,

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,
}

//! Warden Issuance - capped ledger and swap window
//!
//! This crate provides:
//! - The issuance ledger: balances, allowances, cumulative issuance and cap
//! - The transfer gate: a one-way lock on every transfer-style call
//! - The swap engine: converts deposits into issued balances on a
//!   bonus/standard/closed schedule

pub mod error;
pub mod gate;
pub mod ledger;
pub mod swap;

pub use error::{IssuanceError, Result};
pub use gate::TransferGate;
pub use ledger::IssuanceLedger;
pub use swap::{MintReceipt, SwapEngine, SwapPhase, SwapSchedule};

//! Warden Authority - M-of-N confirmation authority
//!
//! This crate provides the authority that gates movement of held value and
//! its own configuration changes:
//! - Owner set and confirmation threshold
//! - Daily spend ceiling for single-owner transfers
//! - Pending value transfers keyed by deterministic operation ids
//! - Pending configuration mutations keyed by variant and arguments
//! - The deposit path into the swap engine

pub mod authority;
pub mod daily_limit;
pub mod error;
pub mod mutations;
pub mod operations;
pub mod owners;

pub use authority::{AuthorityCore, MutationOutcome, RequestOutcome};
pub use daily_limit::DailyLimit;
pub use error::{AuthorityError, Result};
pub use mutations::{Mutation, PendingMutation, PendingMutationRegistry};
pub use operations::{PendingOperation, PendingOperationRegistry};
pub use owners::OwnerSet;

//! Warden Core - Shared types, hashing, events and configuration
//!
//! This crate provides the foundational types for the Warden M-of-N custody
//! authority and its issuance engine: account and operation identifiers,
//! the outbound event log, the clock and network capability seams, and the
//! serde-backed configuration.

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod network;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthorityConfig, ReserveAllocation, SwapConfig, WardenConfig};
pub use error::{Error, Result};
pub use events::{Event, EventLog};
pub use network::{DeliveredCall, InMemoryNetwork, Network};
pub use types::{day_index, AccountId, Amount, OperationId, Timestamp};

/// Seconds per day, the granularity of the daily spend ceiling
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Maximum number of owners an authority may have
pub const MAX_OWNERS: usize = 250;

/// Issuance rate applied during the bonus phase of the swap window
pub const BONUS_RATE: u128 = 140;

/// Issuance rate applied after the bonus phase, until the window closes
pub const DEFAULT_BASE_RATE: u128 = 1;

/// Default bonus phase length in days
pub const DEFAULT_BONUS_PHASE_DAYS: u64 = 3;

/// Default total swap window length in days (bonus phase plus three weeks)
pub const DEFAULT_WINDOW_DAYS: u64 = 24;

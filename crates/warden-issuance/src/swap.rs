//! Time-windowed deposit swap
//!
//! A started window runs through two phases before closing:
//!
//! ```text
//! start            start + bonus_phase      start + window
//!   |---- bonus rate ----|---- base rate ----|---- closed ---->
//! ```
//!
//! Every accepted deposit mints `value * rate` to the depositor. The deposit
//! that takes cumulative issuance to the cap is minted in full, unlocks
//! transfers, and ends the swap.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use warden_core::{AccountId, Amount, SwapConfig, Timestamp};

use crate::error::{IssuanceError, Result};
use crate::ledger::IssuanceLedger;

/// Phase of the swap window at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapPhase {
    NotStarted,
    Bonus,
    Standard,
    Closed,
}

/// Rates and phase boundaries of the swap window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapSchedule {
    pub bonus_phase_secs: u64,
    pub window_secs: u64,
    pub bonus_rate: Amount,
    pub base_rate: Amount,
    pub min_bonus_deposit: Amount,
}

impl SwapSchedule {
    pub fn from_config(config: &SwapConfig) -> Self {
        Self {
            bonus_phase_secs: config.bonus_phase_secs,
            window_secs: config.window_secs,
            bonus_rate: config.bonus_rate,
            base_rate: config.base_rate,
            min_bonus_deposit: config.min_bonus_deposit,
        }
    }

    /// Phase for a given time since the window started
    pub fn phase_at(&self, elapsed: u64) -> SwapPhase {
        if elapsed >= self.window_secs {
            SwapPhase::Closed
        } else if elapsed < self.bonus_phase_secs {
            SwapPhase::Bonus
        } else {
            SwapPhase::Standard
        }
    }

    /// Issuance rate of an open phase
    pub fn rate(&self, phase: SwapPhase) -> Option<Amount> {
        match phase {
            SwapPhase::Bonus => Some(self.bonus_rate),
            SwapPhase::Standard => Some(self.base_rate),
            SwapPhase::NotStarted | SwapPhase::Closed => None,
        }
    }
}

impl Default for SwapSchedule {
    fn default() -> Self {
        Self::from_config(&SwapConfig::default())
    }
}

/// Result of an accepted deposit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MintReceipt {
    pub depositor: AccountId,
    pub value: Amount,
    pub rate: Amount,
    pub issued: Amount,
    pub phase: SwapPhase,
    /// This deposit crossed the cap and closed the swap
    pub swap_closed: bool,
    pub total_issued: Amount,
}

/// Converts deposits into issued balances
#[derive(Debug, Clone)]
pub struct SwapEngine {
    schedule: SwapSchedule,
    ledger: IssuanceLedger,
    started_at: Option<Timestamp>,
    stopped: bool,
    halted: bool,
}

impl SwapEngine {
    pub fn new(schedule: SwapSchedule, ledger: IssuanceLedger) -> Self {
        Self {
            schedule,
            ledger,
            started_at: None,
            stopped: false,
            halted: false,
        }
    }

    /// Build an engine and its ledger from configuration
    pub fn from_config(config: &SwapConfig) -> warden_core::Result<Self> {
        config.validate()?;

        let ledger = match config.reserve {
            Some(reserve) => IssuanceLedger::with_reserve(config.cap, reserve),
            None => IssuanceLedger::new(config.cap),
        };
        Ok(Self::new(SwapSchedule::from_config(config), ledger))
    }

    pub fn schedule(&self) -> &SwapSchedule {
        &self.schedule
    }

    pub fn ledger(&self) -> &IssuanceLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut IssuanceLedger {
        &mut self.ledger
    }

    pub fn started_at(&self) -> Option<Timestamp> {
        self.started_at
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Record the window start
    pub fn start(&mut self, now: Timestamp) -> Result<()> {
        if self.started_at.is_some() {
            return Err(IssuanceError::AlreadyStarted);
        }
        self.started_at = Some(now);
        info!(at = now, "swap window started");
        Ok(())
    }

    /// Close the window ahead of schedule
    pub fn stop(&mut self) -> Result<()> {
        if self.started_at.is_none() {
            return Err(IssuanceError::NotStarted);
        }
        if self.stopped {
            return Err(IssuanceError::WindowClosed);
        }
        self.stopped = true;
        info!("swap window stopped");
        Ok(())
    }

    /// Refuse every further deposit (emergency stop)
    pub fn halt(&mut self) {
        self.halted = true;
    }

    /// Phase at `now`, accounting for stop and cap
    pub fn phase(&self, now: Timestamp) -> SwapPhase {
        match self.started_at {
            None => SwapPhase::NotStarted,
            Some(_) if self.stopped || self.ledger.cap_reached() => SwapPhase::Closed,
            Some(start) => self.schedule.phase_at(now.saturating_sub(start)),
        }
    }

    /// Mint for a deposit of `value` made at `now`
    ///
    /// Any `Err` leaves the engine and ledger unchanged.
    pub fn on_deposit(
        &mut self,
        depositor: &AccountId,
        value: Amount,
        now: Timestamp,
    ) -> Result<MintReceipt> {
        if self.halted {
            return Err(IssuanceError::EmergencyStop);
        }
        let start = self.started_at.ok_or(IssuanceError::NotStarted)?;
        if self.stopped {
            return Err(IssuanceError::WindowClosed);
        }
        if self.ledger.cap_reached() {
            return Err(IssuanceError::CapReached);
        }

        let elapsed = now.saturating_sub(start);
        let phase = self.schedule.phase_at(elapsed);
        let rate = self
            .schedule
            .rate(phase)
            .ok_or(IssuanceError::WindowClosed)?;

        if phase == SwapPhase::Bonus && value < self.schedule.min_bonus_deposit {
            return Err(IssuanceError::BelowMinimum {
                value,
                minimum: self.schedule.min_bonus_deposit,
            });
        }

        let issued = value.checked_mul(rate).ok_or(IssuanceError::Overflow)?;
        let swap_closed = self.ledger.mint(depositor, issued)?;

        debug!(
            depositor = %depositor.short(),
            value,
            rate,
            issued,
            elapsed,
            "deposit minted"
        );

        Ok(MintReceipt {
            depositor: *depositor,
            value,
            rate,
            issued,
            phase,
            swap_closed,
            total_issued: self.ledger.total_issued(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::SECONDS_PER_DAY;

    const T0: Timestamp = 1_497_074_400;
    const ETHER: Amount = 1_000_000_000_000_000_000;

    fn depositor() -> AccountId {
        AccountId::new([0xd0; 20])
    }

    fn engine(cap: Amount) -> SwapEngine {
        SwapEngine::from_config(&SwapConfig::with_cap(cap)).unwrap()
    }

    #[test]
    fn test_deposit_before_start_rejected() {
        let mut swap = engine(1_000);
        assert_eq!(
            swap.on_deposit(&depositor(), 5, T0),
            Err(IssuanceError::NotStarted)
        );
        assert_eq!(swap.ledger().total_issued(), 0);
    }

    #[test]
    fn test_start_twice_fails() {
        let mut swap = engine(1_000);
        swap.start(T0).unwrap();
        assert_eq!(swap.start(T0 + 1), Err(IssuanceError::AlreadyStarted));
        assert_eq!(swap.started_at(), Some(T0));
    }

    #[test]
    fn test_bonus_phase_rate() {
        let mut swap = engine(u128::MAX);
        swap.start(T0).unwrap();

        let receipt = swap
            .on_deposit(&depositor(), 10, T0 + SECONDS_PER_DAY)
            .unwrap();

        assert_eq!(receipt.phase, SwapPhase::Bonus);
        assert_eq!(receipt.issued, 1_400);
        assert_eq!(swap.ledger().balance_of(&depositor()), 1_400);
        assert!(!receipt.swap_closed);
    }

    #[test]
    fn test_phase_boundaries() {
        let mut swap = engine(u128::MAX);
        swap.start(T0).unwrap();
        let bonus_end = T0 + 3 * SECONDS_PER_DAY;
        let window_end = T0 + 24 * SECONDS_PER_DAY;

        assert_eq!(swap.phase(bonus_end - 1), SwapPhase::Bonus);
        assert_eq!(swap.phase(bonus_end), SwapPhase::Standard);
        assert_eq!(swap.phase(window_end - 1), SwapPhase::Standard);
        assert_eq!(swap.phase(window_end), SwapPhase::Closed);

        let receipt = swap.on_deposit(&depositor(), 7, bonus_end).unwrap();
        assert_eq!(receipt.rate, 1);
        assert_eq!(receipt.issued, 7);

        assert_eq!(
            swap.on_deposit(&depositor(), 7, window_end),
            Err(IssuanceError::WindowClosed)
        );
    }

    #[test]
    fn test_cap_crossing_deposit_minted_in_full() {
        let cap = 1_000_000 * ETHER;
        let mut swap = engine(cap);
        swap.start(T0).unwrap();

        let receipt = swap
            .on_deposit(&depositor(), 10_000 * ETHER, T0 + SECONDS_PER_DAY)
            .unwrap();

        assert_eq!(receipt.issued, 10_000 * ETHER * 140);
        assert!(receipt.issued > cap);
        assert!(receipt.swap_closed);
        assert!(!swap.ledger().transfer_locked());
        assert_eq!(swap.phase(T0 + SECONDS_PER_DAY), SwapPhase::Closed);

        assert_eq!(
            swap.on_deposit(&depositor(), 5 * ETHER, T0 + SECONDS_PER_DAY),
            Err(IssuanceError::CapReached)
        );
    }

    #[test]
    fn test_halt_rejects_deposits() {
        let mut swap = engine(1_000);
        swap.start(T0).unwrap();
        swap.halt();

        assert_eq!(
            swap.on_deposit(&depositor(), 1, T0),
            Err(IssuanceError::EmergencyStop)
        );
    }

    #[test]
    fn test_stop_closes_window() {
        let mut swap = engine(1_000);
        assert_eq!(swap.stop(), Err(IssuanceError::NotStarted));

        swap.start(T0).unwrap();
        swap.stop().unwrap();
        assert_eq!(swap.stop(), Err(IssuanceError::WindowClosed));

        assert_eq!(
            swap.on_deposit(&depositor(), 1, T0),
            Err(IssuanceError::WindowClosed)
        );
        assert_eq!(swap.start(T0), Err(IssuanceError::AlreadyStarted));
    }

    #[test]
    fn test_min_bonus_deposit() {
        let config = SwapConfig {
            min_bonus_deposit: 20 * ETHER,
            ..SwapConfig::with_cap(u128::MAX)
        };
        let mut swap = SwapEngine::from_config(&config).unwrap();
        swap.start(T0).unwrap();

        assert!(matches!(
            swap.on_deposit(&depositor(), 5 * ETHER, T0),
            Err(IssuanceError::BelowMinimum { .. })
        ));

        // Standard phase has no minimum
        let receipt = swap
            .on_deposit(&depositor(), 5 * ETHER, T0 + 3 * SECONDS_PER_DAY)
            .unwrap();
        assert_eq!(receipt.issued, 5 * ETHER);
    }

    #[test]
    fn test_overflow_leaves_ledger_untouched() {
        let mut swap = engine(u128::MAX);
        swap.start(T0).unwrap();

        assert_eq!(
            swap.on_deposit(&depositor(), u128::MAX / 2, T0),
            Err(IssuanceError::Overflow)
        );
        assert_eq!(swap.ledger().total_issued(), 0);
    }

    #[test]
    fn test_clock_before_start_counts_as_bonus() {
        let mut swap = engine(u128::MAX);
        swap.start(T0).unwrap();

        let receipt = swap.on_deposit(&depositor(), 1, T0 - 100).unwrap();
        assert_eq!(receipt.phase, SwapPhase::Bonus);
    }
}

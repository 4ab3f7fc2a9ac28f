//! Per-day spend ceiling for the single-owner path

use serde::{Deserialize, Serialize};
use warden_core::Amount;

/// Daily spend ceiling
///
/// `spent_today` belongs to `last_day`; any check against a different day
/// index starts from zero. The authority stages spends on a copy and commits
/// it only after the payout succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyLimit {
    limit: Amount,
    spent_today: Amount,
    last_day: u64,
}

impl DailyLimit {
    pub fn new(limit: Amount, today: u64) -> Self {
        Self {
            limit,
            spent_today: 0,
            last_day: today,
        }
    }

    pub fn limit(&self) -> Amount {
        self.limit
    }

    pub fn last_day(&self) -> u64 {
        self.last_day
    }

    /// Amount spent as seen on `day`
    pub fn spent_on(&self, day: u64) -> Amount {
        if day == self.last_day {
            self.spent_today
        } else {
            0
        }
    }

    /// Headroom left on `day`
    pub fn remaining_on(&self, day: u64) -> Amount {
        self.limit.saturating_sub(self.spent_on(day))
    }

    /// Move to `day`, clearing the spend if the day changed
    ///
    /// Returns true if a rollover happened.
    pub fn roll(&mut self, day: u64) -> bool {
        if day == self.last_day {
            return false;
        }
        self.spent_today = 0;
        self.last_day = day;
        true
    }

    /// Spend `value` on `day` if it fits under the ceiling
    pub fn try_spend(&mut self, value: Amount, day: u64) -> bool {
        self.roll(day);
        match self.spent_today.checked_add(value) {
            Some(total) if total <= self.limit => {
                self.spent_today = total;
                true
            }
            _ => false,
        }
    }

    pub fn set_limit(&mut self, limit: Amount) {
        self.limit = limit;
    }

    pub fn reset(&mut self) {
        self.spent_today = 0;
    }
}

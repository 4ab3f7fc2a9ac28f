//! Authority and swap configuration

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{AccountId, Amount};
use crate::{
    BONUS_RATE, DEFAULT_BASE_RATE, DEFAULT_BONUS_PHASE_DAYS, DEFAULT_WINDOW_DAYS, MAX_OWNERS,
    SECONDS_PER_DAY,
};

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WardenConfig {
    pub authority: AuthorityConfig,
    pub swap: SwapConfig,
}

impl WardenConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.authority.validate()?;
        self.swap.validate()
    }
}

/// Creation parameters of an authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorityConfig {
    /// Account creating the authority; always becomes an owner
    pub creator: AccountId,

    /// Additional owners
    pub owners: Vec<AccountId>,

    /// Confirmations required for multisig operations
    pub required: u32,

    /// Value releasable per day without full confirmation
    pub daily_limit: Amount,
}

impl Default for AuthorityConfig {
    fn default() -> Self {
        Self {
            creator: AccountId::new([0x01; 20]),
            owners: vec![AccountId::new([0x02; 20]), AccountId::new([0x03; 20])],
            required: 2,
            daily_limit: 0,
        }
    }
}

impl AuthorityConfig {
    /// Full owner list, creator first
    pub fn all_owners(&self) -> Vec<AccountId> {
        let mut all = Vec::with_capacity(self.owners.len() + 1);
        all.push(self.creator);
        all.extend(self.owners.iter().copied());
        all
    }

    pub fn validate(&self) -> Result<()> {
        let all = self.all_owners();

        if all.len() > MAX_OWNERS {
            return Err(Error::InvalidConfig(format!(
                "{} owners exceeds the maximum of {}",
                all.len(),
                MAX_OWNERS
            )));
        }

        let mut seen = HashSet::with_capacity(all.len());
        for owner in &all {
            if *owner == AccountId::ZERO {
                return Err(Error::InvalidConfig(
                    "the zero account cannot be an owner".to_string(),
                ));
            }
            if !seen.insert(*owner) {
                return Err(Error::InvalidConfig(format!("duplicate owner {}", owner)));
            }
        }

        if self.required == 0 {
            return Err(Error::InvalidConfig(
                "required confirmations must be >= 1".to_string(),
            ));
        }
        if self.required as usize > all.len() {
            return Err(Error::InvalidConfig(format!(
                "required confirmations {} exceeds owner count {}",
                self.required,
                all.len()
            )));
        }

        Ok(())
    }
}

/// Pre-allocated ledger balance outside the issuance cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReserveAllocation {
    pub holder: AccountId,
    pub amount: Amount,
}

/// Swap window schedule and issuance cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapConfig {
    /// Cumulative issuance at which the swap closes and transfers unlock
    pub cap: Amount,

    /// Rate during the bonus phase
    #[serde(default = "default_bonus_rate")]
    pub bonus_rate: Amount,

    /// Rate after the bonus phase
    #[serde(default = "default_base_rate")]
    pub base_rate: Amount,

    /// Length of the bonus phase (seconds)
    #[serde(default = "default_bonus_phase_secs")]
    pub bonus_phase_secs: u64,

    /// Length of the whole window (seconds)
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Smallest deposit accepted during the bonus phase (0 disables the check)
    #[serde(default)]
    pub min_bonus_deposit: Amount,

    /// Optional reserve credited when the ledger is built
    #[serde(default)]
    pub reserve: Option<ReserveAllocation>,
}

fn default_bonus_rate() -> Amount {
    BONUS_RATE
}

fn default_base_rate() -> Amount {
    DEFAULT_BASE_RATE
}

fn default_bonus_phase_secs() -> u64 {
    DEFAULT_BONUS_PHASE_DAYS * SECONDS_PER_DAY
}

fn default_window_secs() -> u64 {
    DEFAULT_WINDOW_DAYS * SECONDS_PER_DAY
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            cap: 12_500_000 * 10u128.pow(18),
            bonus_rate: default_bonus_rate(),
            base_rate: default_base_rate(),
            bonus_phase_secs: default_bonus_phase_secs(),
            window_secs: default_window_secs(),
            min_bonus_deposit: 0,
            reserve: None,
        }
    }
}

impl SwapConfig {
    /// Default schedule with the given cap
    pub fn with_cap(cap: Amount) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cap == 0 {
            return Err(Error::InvalidConfig("issuance cap must be > 0".to_string()));
        }
        if self.bonus_rate == 0 || self.base_rate == 0 {
            return Err(Error::InvalidConfig("issuance rates must be >= 1".to_string()));
        }
        if self.window_secs == 0 {
            return Err(Error::InvalidConfig("swap window must be > 0".to_string()));
        }
        if self.bonus_phase_secs > self.window_secs {
            return Err(Error::InvalidConfig(format!(
                "bonus phase ({}s) longer than the window ({}s)",
                self.bonus_phase_secs, self.window_secs
            )));
        }
        if let Some(reserve) = &self.reserve {
            if reserve.holder == AccountId::ZERO {
                return Err(Error::InvalidConfig(
                    "reserve holder cannot be the zero account".to_string(),
                ));
            }
        }
        Ok(())
    }
}

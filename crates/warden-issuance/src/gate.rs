//! One-way transfer lock

use serde::{Deserialize, Serialize};

use crate::error::{IssuanceError, Result};

/// Lock on every transfer-style call
///
/// Starts locked and unlocks exactly once; there is no way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferGate {
    locked: bool,
}

impl Default for TransferGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferGate {
    pub fn new() -> Self {
        Self { locked: true }
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Unlock the gate; returns whether this call did the unlocking
    pub fn unlock(&mut self) -> bool {
        let was_locked = self.locked;
        self.locked = false;
        was_locked
    }

    /// Fail with [`IssuanceError::TransferLocked`] while locked
    pub fn ensure_open(&self) -> Result<()> {
        if self.locked {
            return Err(IssuanceError::TransferLocked);
        }
        Ok(())
    }
}

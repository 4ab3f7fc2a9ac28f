//! Issued balances, allowances and the cumulative issuance cap

use std::collections::HashMap;

use tracing::{debug, info};
use warden_core::{AccountId, Amount, Event, EventLog, ReserveAllocation};

use crate::error::{IssuanceError, Result};
use crate::gate::TransferGate;

/// Ledger of issued balances
///
/// Transfer-style calls go through the [`TransferGate`] and fail for every
/// caller until cumulative issuance reaches the cap. Reads never do.
#[derive(Debug, Clone)]
pub struct IssuanceLedger {
    balances: HashMap<AccountId, Amount>,
    allowances: HashMap<(AccountId, AccountId), Amount>,
    total_issued: Amount,
    reserve: Amount,
    cap: Amount,
    gate: TransferGate,
    events: EventLog,
}

impl IssuanceLedger {
    /// Create an empty ledger with the given cap
    pub fn new(cap: Amount) -> Self {
        Self {
            balances: HashMap::new(),
            allowances: HashMap::new(),
            total_issued: 0,
            reserve: 0,
            cap,
            gate: TransferGate::new(),
            events: EventLog::new(),
        }
    }

    /// Create a ledger with a reserve credited up front
    ///
    /// The reserve counts toward total supply but not toward issuance.
    pub fn with_reserve(cap: Amount, reserve: ReserveAllocation) -> Self {
        let mut ledger = Self::new(cap);
        ledger.reserve = reserve.amount;
        ledger.balances.insert(reserve.holder, reserve.amount);
        ledger
    }

    pub fn balance_of(&self, holder: &AccountId) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    pub fn allowance(&self, holder: &AccountId, spender: &AccountId) -> Amount {
        self.allowances
            .get(&(*holder, *spender))
            .copied()
            .unwrap_or(0)
    }

    /// Reserve plus everything issued
    pub fn total_supply(&self) -> Amount {
        self.reserve + self.total_issued
    }

    pub fn total_issued(&self) -> Amount {
        self.total_issued
    }

    pub fn reserve(&self) -> Amount {
        self.reserve
    }

    pub fn cap(&self) -> Amount {
        self.cap
    }

    pub fn cap_reached(&self) -> bool {
        self.total_issued >= self.cap
    }

    pub fn transfer_locked(&self) -> bool {
        self.gate.is_locked()
    }

    pub fn gate(&self) -> &TransferGate {
        &self.gate
    }

    /// Transfer and Approval events emitted by this ledger
    ///
    /// Kept until taken with [`IssuanceLedger::drain_events`].
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Credit newly issued balance
    ///
    /// Returns true when this credit crossed the cap and unlocked transfers.
    pub(crate) fn mint(&mut self, to: &AccountId, amount: Amount) -> Result<bool> {
        let issued = self
            .total_issued
            .checked_add(amount)
            .ok_or(IssuanceError::Overflow)?;
        self.reserve
            .checked_add(issued)
            .ok_or(IssuanceError::Overflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(IssuanceError::Overflow)?;

        self.total_issued = issued;
        self.balances.insert(*to, balance);

        let crossed = self.cap_reached() && self.gate.unlock();
        if crossed {
            info!(total_issued = issued, cap = self.cap, "issuance cap reached, transfers unlocked");
        }
        Ok(crossed)
    }

    /// Move balance from `from` to `to`
    pub fn transfer(&mut self, from: &AccountId, to: &AccountId, value: Amount) -> Result<()> {
        self.gate.ensure_open()?;
        self.move_balance(from, to, value)?;
        self.events.emit(Event::Transfer {
            from: *from,
            to: *to,
            value,
        });
        Ok(())
    }

    /// Let `spender` move up to `value` of `holder`'s balance
    pub fn approve(&mut self, holder: &AccountId, spender: &AccountId, value: Amount) -> Result<()> {
        self.gate.ensure_open()?;
        self.allowances.insert((*holder, *spender), value);
        self.events.emit(Event::Approval {
            owner: *holder,
            spender: *spender,
            value,
        });
        Ok(())
    }

    /// Move balance on behalf of `from`, spending `spender`'s allowance
    pub fn transfer_from(
        &mut self,
        spender: &AccountId,
        from: &AccountId,
        to: &AccountId,
        value: Amount,
    ) -> Result<()> {
        self.gate.ensure_open()?;

        let allowed = self.allowance(from, spender);
        if allowed < value {
            return Err(IssuanceError::InsufficientAllowance {
                spender: *spender,
                needed: value,
                available: allowed,
            });
        }

        self.move_balance(from, to, value)?;
        self.allowances.insert((*from, *spender), allowed - value);
        self.events.emit(Event::Transfer {
            from: *from,
            to: *to,
            value,
        });
        Ok(())
    }

    fn move_balance(&mut self, from: &AccountId, to: &AccountId, value: Amount) -> Result<()> {
        let available = self.balance_of(from);
        if available < value {
            return Err(IssuanceError::InsufficientBalance {
                holder: *from,
                needed: value,
                available,
            });
        }
        if from == to {
            return Ok(());
        }

        let credited = self
            .balance_of(to)
            .checked_add(value)
            .ok_or(IssuanceError::Overflow)?;
        self.balances.insert(*from, available - value);
        self.balances.insert(*to, credited);

        debug!(from = %from.short(), to = %to.short(), value, "ledger transfer");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new([0xa1; 20])
    }

    fn bob() -> AccountId {
        AccountId::new([0xb0; 20])
    }

    fn carol() -> AccountId {
        AccountId::new([0xc0; 20])
    }

    #[test]
    fn test_locked_ledger_rejects_every_transfer_style_call() {
        let mut ledger = IssuanceLedger::new(1_000);
        ledger.mint(&alice(), 500).unwrap();

        assert_eq!(
            ledger.transfer(&alice(), &bob(), 1),
            Err(IssuanceError::TransferLocked)
        );
        assert_eq!(
            ledger.approve(&alice(), &bob(), 10),
            Err(IssuanceError::TransferLocked)
        );
        assert_eq!(
            ledger.transfer_from(&bob(), &alice(), &carol(), 1),
            Err(IssuanceError::TransferLocked)
        );

        // Reads still work and nothing moved
        assert_eq!(ledger.balance_of(&alice()), 500);
        assert_eq!(ledger.balance_of(&bob()), 0);
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn test_mint_crossing_cap_unlocks_once() {
        let mut ledger = IssuanceLedger::new(1_000);

        assert!(!ledger.mint(&alice(), 999).unwrap());
        assert!(ledger.transfer_locked());

        // Crossing mint is credited in full
        assert!(ledger.mint(&bob(), 50).unwrap());
        assert_eq!(ledger.balance_of(&bob()), 50);
        assert_eq!(ledger.total_issued(), 1_049);
        assert!(!ledger.transfer_locked());

        assert!(!ledger.mint(&bob(), 1).unwrap());
        assert!(!ledger.transfer_locked());
    }

    #[test]
    fn test_transfer_after_unlock() {
        let mut ledger = IssuanceLedger::new(100);
        ledger.mint(&alice(), 100).unwrap();

        ledger.transfer(&alice(), &bob(), 30).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 70);
        assert_eq!(ledger.balance_of(&bob()), 30);
        assert_eq!(
            ledger.events().last_named("Transfer"),
            Some(&Event::Transfer {
                from: alice(),
                to: bob(),
                value: 30
            })
        );
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = IssuanceLedger::new(100);
        ledger.mint(&alice(), 100).unwrap();

        let err = ledger.transfer(&alice(), &bob(), 101).unwrap_err();
        assert!(matches!(err, IssuanceError::InsufficientBalance { .. }));
        assert_eq!(ledger.balance_of(&alice()), 100);
    }

    #[test]
    fn test_approve_and_transfer_from() {
        let mut ledger = IssuanceLedger::new(100);
        ledger.mint(&alice(), 100).unwrap();

        ledger.approve(&alice(), &carol(), 10).unwrap();
        ledger.transfer_from(&carol(), &alice(), &bob(), 4).unwrap();

        assert_eq!(ledger.balance_of(&alice()), 96);
        assert_eq!(ledger.balance_of(&bob()), 4);
        assert_eq!(ledger.allowance(&alice(), &carol()), 6);

        let err = ledger
            .transfer_from(&carol(), &alice(), &bob(), 7)
            .unwrap_err();
        assert!(matches!(err, IssuanceError::InsufficientAllowance { .. }));
        assert_eq!(ledger.allowance(&alice(), &carol()), 6);
    }

    #[test]
    fn test_reserve_counts_toward_supply_not_cap() {
        let reserve = ReserveAllocation {
            holder: alice(),
            amount: 1_400,
        };
        let ledger = IssuanceLedger::with_reserve(1_000, reserve);

        assert_eq!(ledger.balance_of(&alice()), 1_400);
        assert_eq!(ledger.total_supply(), 1_400);
        assert_eq!(ledger.total_issued(), 0);
        assert!(!ledger.cap_reached());
        assert!(ledger.transfer_locked());
    }
}

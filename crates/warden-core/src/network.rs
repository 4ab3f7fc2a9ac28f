//! Capability seam between the authority and the accounts it pays out to

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{AccountId, Amount};

/// Where held value goes when the authority executes a call
pub trait Network {
    /// Whether the account holds executable logic of its own
    ///
    /// Calls to such accounts never take the daily-limit path.
    fn has_code(&self, account: &AccountId) -> bool;

    /// Deliver `value` and `payload` to `to`
    ///
    /// Must be all-or-nothing: on `Err` the target is left untouched.
    fn deliver(&mut self, to: &AccountId, value: Amount, payload: &[u8]) -> Result<()>;
}

/// Record of a call delivered by the in-memory network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveredCall {
    pub to: AccountId,
    pub value: Amount,
    pub payload: Vec<u8>,
}

/// In-memory network of plain accounts and contract accounts
#[derive(Debug, Clone, Default)]
pub struct InMemoryNetwork {
    balances: HashMap<AccountId, Amount>,
    contracts: HashSet<AccountId>,
    refusing: HashSet<AccountId>,
    calls: Vec<DeliveredCall>,
}

impl InMemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark an account as holding executable logic
    pub fn deploy_contract(&mut self, account: AccountId) {
        self.contracts.insert(account);
    }

    /// Make an account refuse every delivered call
    pub fn refuse_calls(&mut self, account: AccountId) {
        self.refusing.insert(account);
    }

    /// Native balance of an account
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Every delivered call, oldest first
    pub fn calls(&self) -> &[DeliveredCall] {
        &self.calls
    }
}

impl Network for InMemoryNetwork {
    fn has_code(&self, account: &AccountId) -> bool {
        self.contracts.contains(account)
    }

    fn deliver(&mut self, to: &AccountId, value: Amount, payload: &[u8]) -> Result<()> {
        if self.refusing.contains(to) {
            return Err(Error::CallRejected(to.to_hex()));
        }

        let balance = self.balance_of(to);
        let credited = balance
            .checked_add(value)
            .ok_or_else(|| Error::CallRejected(format!("balance overflow at {}", to)))?;

        self.balances.insert(*to, credited);
        self.calls.push(DeliveredCall {
            to: *to,
            value,
            payload: payload.to_vec(),
        });

        debug!(to = %to.short(), value, payload_len = payload.len(), "delivered call");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_credits_and_records() {
        let mut network = InMemoryNetwork::new();
        let to = AccountId::new([4; 20]);

        network.deliver(&to, 51, &[]).unwrap();
        network.deliver(&to, 0, &[0xab]).unwrap();

        assert_eq!(network.balance_of(&to), 51);
        assert_eq!(network.calls().len(), 2);
        assert_eq!(network.calls()[1].payload, vec![0xab]);
    }

    #[test]
    fn test_refusing_account_is_untouched() {
        let mut network = InMemoryNetwork::new();
        let to = AccountId::new([5; 20]);
        network.refuse_calls(to);

        assert!(matches!(
            network.deliver(&to, 10, &[]),
            Err(Error::CallRejected(_))
        ));
        assert_eq!(network.balance_of(&to), 0);
        assert!(network.calls().is_empty());
    }

    #[test]
    fn test_contracts_report_code() {
        let mut network = InMemoryNetwork::new();
        let contract = AccountId::new([6; 20]);
        network.deploy_contract(contract);

        assert!(network.has_code(&contract));
        assert!(!network.has_code(&AccountId::new([7; 20])));
    }
}

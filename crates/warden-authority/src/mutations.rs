//! Configuration changes and their pending votes
//!
//! Each change is an explicit variant; two calls vote for the same pending
//! mutation exactly when their variants compare equal.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use warden_core::{AccountId, Amount, OperationId};

/// A configuration change gated by the confirmation threshold
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mutation {
    AddOwner(AccountId),
    RemoveOwner(AccountId),
    ChangeOwner { from: AccountId, to: AccountId },
    SetThreshold(u32),
    SetDailyLimit(Amount),
    ResetSpend,
    ActivateEmergencyStop,
    Teardown { destination: AccountId },
}

impl Mutation {
    /// Variant name for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Mutation::AddOwner(_) => "add_owner",
            Mutation::RemoveOwner(_) => "remove_owner",
            Mutation::ChangeOwner { .. } => "change_owner",
            Mutation::SetThreshold(_) => "set_threshold",
            Mutation::SetDailyLimit(_) => "set_daily_limit",
            Mutation::ResetSpend => "reset_spend",
            Mutation::ActivateEmergencyStop => "activate_emergency_stop",
            Mutation::Teardown { .. } => "teardown",
        }
    }

    /// Canonical encoding: one tag byte followed by the arguments
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(41);
        match self {
            Mutation::AddOwner(account) => {
                out.push(0x01);
                out.extend_from_slice(account.as_bytes());
            }
            Mutation::RemoveOwner(account) => {
                out.push(0x02);
                out.extend_from_slice(account.as_bytes());
            }
            Mutation::ChangeOwner { from, to } => {
                out.push(0x03);
                out.extend_from_slice(from.as_bytes());
                out.extend_from_slice(to.as_bytes());
            }
            Mutation::SetThreshold(required) => {
                out.push(0x04);
                out.extend_from_slice(&required.to_be_bytes());
            }
            Mutation::SetDailyLimit(limit) => {
                out.push(0x05);
                out.extend_from_slice(&limit.to_be_bytes());
            }
            Mutation::ResetSpend => out.push(0x06),
            Mutation::ActivateEmergencyStop => out.push(0x07),
            Mutation::Teardown { destination } => {
                out.push(0x08);
                out.extend_from_slice(destination.as_bytes());
            }
        }
        out
    }

    /// Deterministic id of this mutation on a given authority
    pub fn id(&self, authority: &AccountId) -> OperationId {
        OperationId::for_mutation(authority, &self.encode())
    }

    /// Whether applying it changes who may vote or how many votes count
    pub fn changes_membership(&self) -> bool {
        matches!(
            self,
            Mutation::AddOwner(_)
                | Mutation::RemoveOwner(_)
                | Mutation::ChangeOwner { .. }
                | Mutation::SetThreshold(_)
        )
    }
}

/// Votes collected for one mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMutation {
    pub mutation: Mutation,
    pub id: OperationId,
    confirmations: BTreeSet<AccountId>,
}

impl PendingMutation {
    pub fn new(mutation: Mutation, id: OperationId) -> Self {
        Self {
            mutation,
            id,
            confirmations: BTreeSet::new(),
        }
    }

    pub fn confirmations(&self) -> impl Iterator<Item = &AccountId> {
        self.confirmations.iter()
    }

    pub fn confirmation_count(&self) -> usize {
        self.confirmations.len()
    }

    pub fn has_confirmed(&self, owner: &AccountId) -> bool {
        self.confirmations.contains(owner)
    }
}

/// Pending mutations keyed by variant and arguments
#[derive(Debug, Clone, Default)]
pub struct PendingMutationRegistry {
    entries: HashMap<Mutation, PendingMutation>,
}

impl PendingMutationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mutation: &Mutation) -> Option<&PendingMutation> {
        self.entries.get(mutation)
    }

    /// Record `owner`'s vote, opening the entry if needed
    ///
    /// Returns the confirmation count after the vote.
    pub fn vote(&mut self, mutation: &Mutation, id: OperationId, owner: AccountId) -> usize {
        let entry = self
            .entries
            .entry(mutation.clone())
            .or_insert_with(|| PendingMutation::new(mutation.clone(), id));
        entry.confirmations.insert(owner);
        entry.confirmations.len()
    }

    pub fn remove(&mut self, mutation: &Mutation) -> Option<PendingMutation> {
        self.entries.remove(mutation)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingMutation> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 20])
    }

    #[test]
    fn test_arguments_distinguish_mutations() {
        let authority = account(0xaa);
        let a = Mutation::AddOwner(account(1));
        let b = Mutation::AddOwner(account(2));

        assert_ne!(a, b);
        assert_ne!(a.id(&authority), b.id(&authority));
        assert_eq!(a.id(&authority), Mutation::AddOwner(account(1)).id(&authority));
    }

    #[test]
    fn test_variants_do_not_collide() {
        let authority = account(0xaa);
        let add = Mutation::AddOwner(account(1));
        let remove = Mutation::RemoveOwner(account(1));
        assert_ne!(add.encode(), remove.encode());
        assert_ne!(add.id(&authority), remove.id(&authority));
    }

    #[test]
    fn test_votes_accumulate_per_entry() {
        let mut registry = PendingMutationRegistry::new();
        let mutation = Mutation::SetDailyLimit(10);
        let id = mutation.id(&account(0xaa));

        assert_eq!(registry.vote(&mutation, id, account(1)), 1);
        assert_eq!(registry.vote(&mutation, id, account(1)), 1);
        assert_eq!(registry.vote(&mutation, id, account(2)), 2);

        let other = Mutation::SetDailyLimit(11);
        assert_eq!(registry.vote(&other, other.id(&account(0xaa)), account(2)), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_membership_classification() {
        assert!(Mutation::SetThreshold(2).changes_membership());
        assert!(!Mutation::ResetSpend.changes_membership());
        assert!(!Mutation::Teardown {
            destination: account(1)
        }
        .changes_membership());
    }
}

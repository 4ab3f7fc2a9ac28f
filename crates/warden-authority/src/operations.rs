//! Pending value transfers awaiting confirmation

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use warden_core::{AccountId, Amount, OperationId};

/// A value transfer that still needs confirmations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub id: OperationId,
    pub initiator: AccountId,
    pub to: AccountId,
    pub value: Amount,
    pub payload: Vec<u8>,
    pub sequence: u64,
    confirmations: BTreeSet<AccountId>,
}

impl PendingOperation {
    pub fn new(
        id: OperationId,
        initiator: AccountId,
        to: AccountId,
        value: Amount,
        payload: Vec<u8>,
        sequence: u64,
    ) -> Self {
        let mut confirmations = BTreeSet::new();
        confirmations.insert(initiator);
        Self {
            id,
            initiator,
            to,
            value,
            payload,
            sequence,
            confirmations,
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

    /// Returns false if the owner already confirmed
    pub fn confirm(&mut self, owner: AccountId) -> bool {
        self.confirmations.insert(owner)
    }

    /// Returns false if the owner had not confirmed
    pub fn revoke(&mut self, owner: &AccountId) -> bool {
        self.confirmations.remove(owner)
    }
}

/// Pending transfers keyed by operation id, plus the request sequence
///
/// The sequence only moves forward, so an id is never handed out twice by
/// the same authority.
#[derive(Debug, Clone, Default)]
pub struct PendingOperationRegistry {
    entries: HashMap<OperationId, PendingOperation>,
    sequence: u64,
}

impl PendingOperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next request will use
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Id the next request for this transfer would get
    pub fn next_id(
        &self,
        authority: &AccountId,
        to: &AccountId,
        value: Amount,
        payload: &[u8],
    ) -> OperationId {
        OperationId::for_transfer(authority, to, value, payload, self.sequence)
    }

    /// Consume the current sequence number
    pub fn advance_sequence(&mut self) {
        self.sequence += 1;
    }

    pub fn insert(&mut self, operation: PendingOperation) {
        self.entries.insert(operation.id, operation);
    }

    pub fn get(&self, id: &OperationId) -> Option<&PendingOperation> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &OperationId) -> Option<&mut PendingOperation> {
        self.entries.get_mut(id)
    }

    pub fn remove(&mut self, id: &OperationId) -> Option<PendingOperation> {
        self.entries.remove(id)
    }

    pub fn contains(&self, id: &OperationId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every pending entry; the sequence keeps counting
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingOperation> {
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
    fn test_initiator_counts_as_first_confirmation() {
        let op = PendingOperation::new(
            OperationId::new([1; 32]),
            account(1),
            account(9),
            51,
            Vec::new(),
            0,
        );
        assert_eq!(op.confirmation_count(), 1);
        assert!(op.has_confirmed(&account(1)));
    }

    #[test]
    fn test_confirm_and_revoke_are_idempotent() {
        let mut op = PendingOperation::new(
            OperationId::new([1; 32]),
            account(1),
            account(9),
            51,
            Vec::new(),
            0,
        );
        assert!(op.confirm(account(2)));
        assert!(!op.confirm(account(2)));
        assert!(op.revoke(&account(2)));
        assert!(!op.revoke(&account(2)));
        assert_eq!(op.confirmation_count(), 1);
    }

    #[test]
    fn test_sequence_changes_next_id() {
        let authority = account(0xaa);
        let mut registry = PendingOperationRegistry::new();

        let first = registry.next_id(&authority, &account(9), 51, &[]);
        assert_eq!(first, registry.next_id(&authority, &account(9), 51, &[]));

        registry.advance_sequence();
        let second = registry.next_id(&authority, &account(9), 51, &[]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_clear_keeps_sequence() {
        let mut registry = PendingOperationRegistry::new();
        let id = OperationId::new([3; 32]);
        registry.insert(PendingOperation::new(id, account(1), account(2), 1, Vec::new(), 0));
        registry.advance_sequence();

        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.contains(&id));
        assert_eq!(registry.sequence(), 1);
    }
}

//! Ordered owner set

use serde::{Deserialize, Serialize};
use warden_core::{AccountId, MAX_OWNERS};

/// Unique owners in insertion order
///
/// Order matters only for index queries; removal keeps the relative order
/// of the remaining owners and a change keeps the replaced owner's slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSet {
    members: Vec<AccountId>,
}

impl OwnerSet {
    /// Build from a list already checked for duplicates
    pub fn from_unique(members: Vec<AccountId>) -> Self {
        Self { members }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= MAX_OWNERS
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.members.contains(account)
    }

    pub fn get(&self, index: usize) -> Option<&AccountId> {
        self.members.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.members.iter()
    }

    pub fn as_slice(&self) -> &[AccountId] {
        &self.members
    }

    /// Returns false if already present or full
    pub fn add(&mut self, account: AccountId) -> bool {
        if self.contains(&account) || self.is_full() {
            return false;
        }
        self.members.push(account);
        true
    }

    pub fn remove(&mut self, account: &AccountId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != account);
        self.members.len() != before
    }

    /// Put `to` in `from`'s slot
    pub fn replace(&mut self, from: &AccountId, to: AccountId) -> bool {
        if self.contains(&to) {
            return false;
        }
        match self.members.iter_mut().find(|m| *m == from) {
            Some(slot) => {
                *slot = to;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(n: u8) -> AccountId {
        AccountId::new([n; 20])
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut owners = OwnerSet::from_unique(vec![account(1)]);
        assert!(owners.add(account(2)));
        assert!(!owners.add(account(2)));
        assert_eq!(owners.len(), 2);
    }

    #[test]
    fn test_remove_keeps_order() {
        let mut owners = OwnerSet::from_unique(vec![account(1), account(2), account(3)]);
        assert!(owners.remove(&account(2)));
        assert!(!owners.remove(&account(2)));
        assert_eq!(owners.as_slice(), &[account(1), account(3)]);
    }

    #[test]
    fn test_replace_keeps_slot() {
        let mut owners = OwnerSet::from_unique(vec![account(1), account(2)]);
        assert!(owners.replace(&account(1), account(5)));
        assert_eq!(owners.get(0), Some(&account(5)));

        // Target already an owner
        assert!(!owners.replace(&account(5), account(2)));
        // Source not an owner
        assert!(!owners.replace(&account(9), account(7)));
    }

    #[test]
    fn test_full_set_refuses_more() {
        let members = (0..MAX_OWNERS)
            .map(|i| {
                let mut bytes = [0u8; 20];
                bytes[..8].copy_from_slice(&(i as u64 + 1).to_be_bytes());
                AccountId::new(bytes)
            })
            .collect();
        let mut owners = OwnerSet::from_unique(members);

        assert!(owners.is_full());
        assert!(!owners.add(account(0xff)));
    }
}

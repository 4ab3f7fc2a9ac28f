//! Property-based tests for warden-core using proptest
//!
//! These tests verify invariants that should hold for all valid inputs.

use proptest::prelude::*;
use warden_core::{day_index, AccountId, OperationId, SECONDS_PER_DAY};

fn arb_account() -> impl Strategy<Value = AccountId> {
    any::<[u8; 20]>().prop_map(AccountId::new)
}

proptest! {
    /// Hex encoding round-trips for every account
    #[test]
    fn account_hex_roundtrip(account in arb_account()) {
        let parsed = AccountId::from_hex(&account.to_hex()).unwrap();
        prop_assert_eq!(parsed, account);
    }

    /// Identical requests at different sequence numbers never share an id
    #[test]
    fn transfer_ids_distinct_across_sequences(
        authority in arb_account(),
        to in arb_account(),
        value in any::<u128>(),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        seq_a in any::<u64>(),
        seq_b in any::<u64>(),
    ) {
        prop_assume!(seq_a != seq_b);
        let a = OperationId::for_transfer(&authority, &to, value, &payload, seq_a);
        let b = OperationId::for_transfer(&authority, &to, value, &payload, seq_b);
        prop_assert_ne!(a, b);
    }

    /// Identifier derivation is a pure function of its inputs
    #[test]
    fn transfer_ids_deterministic(
        authority in arb_account(),
        to in arb_account(),
        value in any::<u128>(),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        seq in any::<u64>(),
    ) {
        let a = OperationId::for_transfer(&authority, &to, value, &payload, seq);
        let b = OperationId::for_transfer(&authority, &to, value, &payload, seq);
        prop_assert_eq!(a, b);
    }

    /// Day index only changes on a day boundary
    #[test]
    fn day_index_changes_on_boundary(now in 0u64..(u64::MAX / 2)) {
        let today = day_index(now);
        let start_of_day = today * SECONDS_PER_DAY;
        prop_assert_eq!(day_index(start_of_day), today);
        prop_assert_eq!(day_index(start_of_day + SECONDS_PER_DAY - 1), today);
        prop_assert_eq!(day_index(start_of_day + SECONDS_PER_DAY), today + 1);
    }
}

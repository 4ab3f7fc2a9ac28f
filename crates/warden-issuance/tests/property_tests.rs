//! Property-based tests for the swap engine and transfer gate

use proptest::prelude::*;
use warden_core::{AccountId, SwapConfig, Timestamp, SECONDS_PER_DAY};
use warden_issuance::{IssuanceError, SwapEngine};

const T0: Timestamp = 1_497_074_400;

fn arb_account() -> impl Strategy<Value = AccountId> {
    any::<[u8; 20]>().prop_map(AccountId::new)
}

proptest! {
    /// Every bonus-phase deposit mints exactly value * 140
    #[test]
    fn bonus_phase_mints_value_times_140(
        depositor in arb_account(),
        value in 1u128..1_000_000_000_000_000_000_000u128,
        offset in 0u64..(3 * SECONDS_PER_DAY),
    ) {
        let mut swap = SwapEngine::from_config(&SwapConfig::with_cap(u128::MAX / 2)).unwrap();
        swap.start(T0).unwrap();

        let receipt = swap.on_deposit(&depositor, value, T0 + offset).unwrap();
        prop_assert_eq!(receipt.issued, value * 140);
        prop_assert_eq!(swap.ledger().balance_of(&depositor), value * 140);
    }

    /// Once unlocked, the gate stays unlocked and later deposits are refused
    #[test]
    fn gate_never_relocks(
        deposits in prop::collection::vec((arb_account(), 1u128..10_000u128, 0u64..(24 * SECONDS_PER_DAY)), 1..40),
        cap in 1u128..200_000u128,
    ) {
        let mut swap = SwapEngine::from_config(&SwapConfig::with_cap(cap)).unwrap();
        swap.start(T0).unwrap();

        let mut unlocked = false;
        for (depositor, value, offset) in deposits {
            let before = swap.ledger().total_issued();
            let result = swap.on_deposit(&depositor, value, T0 + offset);

            if unlocked {
                prop_assert_eq!(result, Err(IssuanceError::CapReached));
                prop_assert_eq!(swap.ledger().total_issued(), before);
            } else {
                let receipt = result.unwrap();
                prop_assert_eq!(receipt.total_issued, before + receipt.issued);
                prop_assert_eq!(receipt.swap_closed, receipt.total_issued >= cap);
            }

            unlocked |= !swap.ledger().transfer_locked();
            prop_assert_eq!(swap.ledger().transfer_locked(), !unlocked);
        }
    }
}

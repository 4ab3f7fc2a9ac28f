#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_core::{AccountId, SwapConfig};
use warden_issuance::{IssuanceError, SwapEngine};

#[derive(Debug, Arbitrary)]
struct Input {
    cap: u64,
    deposits: Vec<(u8, u64, u32)>,
}

fuzz_target!(|input: Input| {
    let cap = u128::from(input.cap).max(1);
    let mut swap = SwapEngine::from_config(&SwapConfig::with_cap(cap)).unwrap();
    let start = 1_497_074_400u64;
    swap.start(start).unwrap();

    let mut unlocked = false;
    for (who, value, offset) in input.deposits {
        let depositor = AccountId::new([who; 20]);
        let before = swap.ledger().total_issued();
        let result = swap.on_deposit(&depositor, value.into(), start + u64::from(offset));

        match result {
            Ok(receipt) => {
                assert!(!unlocked);
                assert_eq!(receipt.issued, u128::from(value) * receipt.rate);
                assert_eq!(receipt.total_issued, before + receipt.issued);
            }
            Err(IssuanceError::CapReached) => assert!(unlocked),
            Err(_) => assert_eq!(swap.ledger().total_issued(), before),
        }

        // The gate never relocks
        if unlocked {
            assert!(!swap.ledger().transfer_locked());
        }
        unlocked = !swap.ledger().transfer_locked();
        assert_eq!(unlocked, swap.ledger().cap_reached());
    }
});

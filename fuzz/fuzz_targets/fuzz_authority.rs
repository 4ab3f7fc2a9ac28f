#![no_main]

use std::sync::Arc;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_authority::{AuthorityCore, Mutation, RequestOutcome};
use warden_core::{AccountId, InMemoryNetwork, ManualClock, OperationId, SwapConfig};
use warden_issuance::SwapEngine;

#[derive(Debug, Arbitrary)]
enum Call {
    Request { caller: u8, to: u8, value: u16, payload: Vec<u8> },
    Confirm { caller: u8 },
    Revoke { caller: u8 },
    AddOwner { caller: u8, owner: u8 },
    RemoveOwner { caller: u8, owner: u8 },
    ChangeOwner { caller: u8, from: u8, to: u8 },
    SetThreshold { caller: u8, required: u8 },
    SetDailyLimit { caller: u8, limit: u16 },
    ResetSpend { caller: u8 },
    Deposit { from: u8, value: u16 },
    Advance { seconds: u32 },
}

// Few distinct accounts so calls hit existing owners
fn account(n: u8) -> AccountId {
    AccountId::new([n % 6 + 1; 20])
}

fuzz_target!(|calls: Vec<Call>| {
    let clock = ManualClock::new(1_497_074_400);
    let mut core = AuthorityCore::create(
        account(0),
        &[account(1), account(2)],
        2,
        100,
        InMemoryNetwork::new(),
        Arc::new(clock.clone()),
    )
    .unwrap();
    let engine = SwapEngine::from_config(&SwapConfig::with_cap(u128::MAX)).unwrap();
    core.configure_issuance(&account(0), engine).unwrap();
    core.start_swap_window(&account(0)).unwrap();

    let mut latest: Option<OperationId> = None;

    for call in calls {
        // Hard rejections are fine; panics and broken invariants are not
        match call {
            Call::Request { caller, to, value, payload } => {
                if let Ok(RequestOutcome::Pending { operation, .. }) =
                    core.request_or_execute(&account(caller), &account(to), value.into(), &payload)
                {
                    latest = Some(operation);
                }
            }
            Call::Confirm { caller } => {
                if let Some(id) = latest {
                    let _ = core.confirm(&account(caller), &id);
                }
            }
            Call::Revoke { caller } => {
                if let Some(id) = latest {
                    let _ = core.revoke(&account(caller), &id);
                }
            }
            Call::AddOwner { caller, owner } => {
                let _ = core.propose(&account(caller), Mutation::AddOwner(account(owner)));
            }
            Call::RemoveOwner { caller, owner } => {
                let _ = core.propose(&account(caller), Mutation::RemoveOwner(account(owner)));
            }
            Call::ChangeOwner { caller, from, to } => {
                let mutation = Mutation::ChangeOwner {
                    from: account(from),
                    to: account(to),
                };
                let _ = core.propose(&account(caller), mutation);
            }
            Call::SetThreshold { caller, required } => {
                let _ = core.propose(&account(caller), Mutation::SetThreshold((required % 8).into()));
            }
            Call::SetDailyLimit { caller, limit } => {
                let _ = core.propose(&account(caller), Mutation::SetDailyLimit(limit.into()));
            }
            Call::ResetSpend { caller } => {
                let _ = core.propose(&account(caller), Mutation::ResetSpend);
            }
            Call::Deposit { from, value } => {
                let _ = core.accept_deposit(&account(from), value.into());
            }
            Call::Advance { seconds } => clock.advance(seconds.into()),
        }

        let owners = core.owners();
        assert!(!owners.is_empty());
        assert!(core.required() >= 1);
        assert!(core.required() as usize <= owners.len());

        if let Some(pending) = latest.and_then(|id| core.pending_operation(&id)) {
            assert!(pending.confirmation_count() < core.required() as usize);
            assert!(pending.confirmations().all(|c| core.is_owner(c)));
        }
    }
});

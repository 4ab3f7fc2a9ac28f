#![no_main]

use std::sync::Arc;

use libfuzzer_sys::fuzz_target;
use warden_authority::AuthorityCore;
use warden_core::{InMemoryNetwork, ManualClock, WardenConfig};
use warden_issuance::SwapEngine;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = serde_json::from_slice::<WardenConfig>(data) else {
        return;
    };

    // Validation decides; building must agree with it
    let valid = config.validate().is_ok();
    let authority = AuthorityCore::from_config(
        &config.authority,
        InMemoryNetwork::new(),
        Arc::new(ManualClock::new(0)),
    );
    let engine = SwapEngine::from_config(&config.swap);
    assert_eq!(valid, authority.is_ok() && engine.is_ok());

    if let Ok(core) = authority {
        assert_eq!(core.owner_count(), config.authority.owners.len() + 1);
    }
});

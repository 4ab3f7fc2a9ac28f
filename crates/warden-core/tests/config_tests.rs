//! Configuration file tests

use tempfile::tempdir;
use warden_core::{AccountId, Error, ReserveAllocation, SwapConfig, WardenConfig};

#[test]
fn test_config_save_and_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.json");

    let mut config = WardenConfig::default();
    config.authority.daily_limit = 5 * 10u128.pow(18);
    config.swap = SwapConfig {
        reserve: Some(ReserveAllocation {
            holder: AccountId::new([0x0a; 20]),
            amount: 1_400_000 * 10u128.pow(18),
        }),
        ..SwapConfig::with_cap(11_100_000 * 10u128.pow(18))
    };

    config.save(&path).unwrap();
    let loaded = WardenConfig::load(&path).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_load_rejects_invalid_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.json");

    let mut config = WardenConfig::default();
    config.authority.required = 9;
    config.save(&path).unwrap();

    assert!(matches!(
        WardenConfig::load(&path),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");

    assert!(matches!(WardenConfig::load(&path), Err(Error::Io(_))));
}

#[test]
fn test_load_garbage_is_serialization_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("warden.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert!(matches!(
        WardenConfig::load(&path),
        Err(Error::Serialization(_))
    ));
}

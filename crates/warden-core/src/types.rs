//! Core identifiers, amounts and deterministic operation hashing

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::SECONDS_PER_DAY;

/// Value amount in the smallest unit
pub type Amount = u128;

/// Unix timestamp in seconds
pub type Timestamp = u64;

/// Day index used by the daily spend ceiling
pub fn day_index(now: Timestamp) -> u64 {
    now / SECONDS_PER_DAY
}

/// Domain tag for value-transfer operation identifiers
const OPERATION_TAG: &[u8] = b"warden.operation.v1";

/// Domain tag for configuration mutation identifiers
const MUTATION_TAG: &[u8] = b"warden.mutation.v1";

/// Domain tag for authority address derivation
const AUTHORITY_TAG: &[u8] = b"warden.authority.v1";

/// Account identifier (20 bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(#[serde(with = "hex_prefixed")] pub [u8; 20]);

impl AccountId {
    /// The all-zero account
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Create a new AccountId from bytes
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the bytes of the AccountId
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to `0x`-prefixed hex string
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex, with or without the `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Short display format (first 4 bytes as hex)
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..4]))
    }

    /// Derive the address of an authority from its creation parameters
    pub fn for_authority(
        creator: &AccountId,
        owners: &[AccountId],
        required: u32,
        daily_limit: Amount,
    ) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(AUTHORITY_TAG);
        hasher.update(creator.as_bytes());
        hasher.update((owners.len() as u64).to_be_bytes());
        for owner in owners {
            hasher.update(owner.as_bytes());
        }
        hasher.update(required.to_be_bytes());
        hasher.update(daily_limit.to_be_bytes());
        let digest: [u8; 32] = hasher.finalize().into();

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Self(bytes)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.short())
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for AccountId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Deterministic identifier of a pending operation or mutation (32 bytes)
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperationId(#[serde(with = "hex_prefixed")] pub [u8; 32]);

impl OperationId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Short display format (first 4 bytes as hex)
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..4]))
    }

    /// Identifier of a value-transfer request
    ///
    /// Keccak-256 over the canonical encoding of the authority address,
    /// target, value, payload and sequence number. The sequence makes two
    /// structurally identical requests hash to different identifiers.
    pub fn for_transfer(
        authority: &AccountId,
        to: &AccountId,
        value: Amount,
        payload: &[u8],
        sequence: u64,
    ) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(OPERATION_TAG);
        hasher.update(authority.as_bytes());
        hasher.update(to.as_bytes());
        hasher.update(value.to_be_bytes());
        hasher.update((payload.len() as u64).to_be_bytes());
        hasher.update(payload);
        hasher.update(sequence.to_be_bytes());
        Self(hasher.finalize().into())
    }

    /// Identifier of a configuration mutation, from its canonical encoding
    pub fn for_mutation(authority: &AccountId, encoded: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(MUTATION_TAG);
        hasher.update(authority.as_bytes());
        hasher.update(encoded);
        Self(hasher.finalize().into())
    }
}

impl fmt::Debug for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperationId({})", self.short())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for OperationId {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Serde helper for fixed-size byte arrays as `0x`-prefixed hex strings
pub mod hex_prefixed {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut bytes = [0u8; N];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)
            .map_err(serde::de::Error::custom)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_hex_roundtrip() {
        let account = AccountId::new([0xab; 20]);
        let hex = account.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(AccountId::from_hex(&hex).unwrap(), account);
        assert_eq!(AccountId::from_hex(&hex[2..]).unwrap(), account);
    }

    #[test]
    fn test_account_serde_is_hex_string() {
        let account = AccountId::new([0x01; 20]);
        let json = serde_json::to_string(&account).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, account);
    }

    #[test]
    fn test_transfer_id_depends_on_sequence() {
        let authority = AccountId::new([9; 20]);
        let to = AccountId::new([1; 20]);

        let first = OperationId::for_transfer(&authority, &to, 10, b"", 0);
        let again = OperationId::for_transfer(&authority, &to, 10, b"", 0);
        let next = OperationId::for_transfer(&authority, &to, 10, b"", 1);

        assert_eq!(first, again);
        assert_ne!(first, next);
    }

    #[test]
    fn test_transfer_id_payload_length_is_framed() {
        let authority = AccountId::new([9; 20]);
        let to = AccountId::new([1; 20]);

        let a = OperationId::for_transfer(&authority, &to, 0, &[0xab, 0x34], 7);
        let b = OperationId::for_transfer(&authority, &to, 0, &[0xab, 0x34, 0x00], 7);
        assert_ne!(a, b);
    }

    #[test]
    fn test_ids_are_scoped_to_authority() {
        let to = AccountId::new([1; 20]);
        let a = OperationId::for_transfer(&AccountId::new([2; 20]), &to, 5, b"", 0);
        let b = OperationId::for_transfer(&AccountId::new([3; 20]), &to, 5, b"", 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_authority_address_is_deterministic() {
        let creator = AccountId::new([1; 20]);
        let owners = [AccountId::new([2; 20]), AccountId::new([3; 20])];

        let a = AccountId::for_authority(&creator, &owners, 2, 100);
        let b = AccountId::for_authority(&creator, &owners, 2, 100);
        let c = AccountId::for_authority(&creator, &owners, 1, 100);

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_day_index() {
        assert_eq!(day_index(0), 0);
        assert_eq!(day_index(SECONDS_PER_DAY - 1), 0);
        assert_eq!(day_index(SECONDS_PER_DAY), 1);
    }
}

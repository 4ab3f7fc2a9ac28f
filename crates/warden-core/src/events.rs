//! Outbound notifications emitted by the authority and the issuance ledger

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{AccountId, Amount, OperationId, Timestamp};

/// Event emitted by a committed call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// Value deposited into the authority
    Deposit { from: AccountId, value: Amount },

    /// Value released on the daily-limit path by a single owner
    SimpleExecuted {
        owner: AccountId,
        value: Amount,
        to: AccountId,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
    },

    /// A value transfer needs more confirmations
    ConfirmationRequired {
        operation: OperationId,
        initiator: AccountId,
        value: Amount,
        to: AccountId,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
    },

    /// An owner confirmed a pending operation or mutation
    Confirmed {
        owner: AccountId,
        operation: OperationId,
    },

    /// A confirmed value transfer was carried out
    Executed {
        owner: AccountId,
        operation: OperationId,
        value: Amount,
        to: AccountId,
        #[serde(with = "hex_payload")]
        payload: Vec<u8>,
    },

    /// An owner withdrew a confirmation
    Revoked {
        owner: AccountId,
        operation: OperationId,
    },

    OwnerAdded { new_owner: AccountId },

    OwnerRemoved { old_owner: AccountId },

    OwnerChanged {
        old_owner: AccountId,
        new_owner: AccountId,
    },

    RequirementChanged { new_requirement: u32 },

    DailyLimitChanged { new_limit: Amount },

    SpentTodayReset,

    EmergencyStopActivated,

    /// The authority released its held value and shut down
    Decommissioned {
        destination: AccountId,
        value: Amount,
    },

    SwapStarted { at: Timestamp },

    SwapStopped,

    /// Issued balance credited for a deposit
    Minted { holder: AccountId, amount: Amount },

    /// Issuance cap reached; transfers are unlocked for good
    SwapClosed { total_issued: Amount },

    /// Ledger balance moved between holders
    Transfer {
        from: AccountId,
        to: AccountId,
        value: Amount,
    },

    /// Ledger allowance set
    Approval {
        owner: AccountId,
        spender: AccountId,
        value: Amount,
    },
}

impl Event {
    /// Event name as observers see it
    pub fn name(&self) -> &'static str {
        match self {
            Event::Deposit { .. } => "Deposit",
            Event::SimpleExecuted { .. } => "SimpleExecuted",
            Event::ConfirmationRequired { .. } => "ConfirmationRequired",
            Event::Confirmed { .. } => "Confirmed",
            Event::Executed { .. } => "Executed",
            Event::Revoked { .. } => "Revoked",
            Event::OwnerAdded { .. } => "OwnerAdded",
            Event::OwnerRemoved { .. } => "OwnerRemoved",
            Event::OwnerChanged { .. } => "OwnerChanged",
            Event::RequirementChanged { .. } => "RequirementChanged",
            Event::DailyLimitChanged { .. } => "DailyLimitChanged",
            Event::SpentTodayReset => "SpentTodayReset",
            Event::EmergencyStopActivated => "EmergencyStopActivated",
            Event::Decommissioned { .. } => "Decommissioned",
            Event::SwapStarted { .. } => "SwapStarted",
            Event::SwapStopped => "SwapStopped",
            Event::Minted { .. } => "Minted",
            Event::SwapClosed { .. } => "SwapClosed",
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
        }
    }
}

/// Ordered log of emitted events
///
/// Unbounded: entries stay until [`EventLog::drain`] takes them.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Append an event
    pub fn emit(&mut self, event: Event) {
        debug!(event = event.name(), "emit");
        self.entries.push(event);
    }

    /// Append a batch of events staged during a call, in order
    pub fn extend(&mut self, events: impl IntoIterator<Item = Event>) {
        for event in events {
            self.emit(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Event] {
        &self.entries
    }

    /// Most recent event with the given name
    pub fn last_named(&self, name: &str) -> Option<&Event> {
        self.entries.iter().rev().find(|e| e.name() == name)
    }

    /// Number of events with the given name
    pub fn count_named(&self, name: &str) -> usize {
        self.entries.iter().filter(|e| e.name() == name).count()
    }

    /// Take every event, leaving the log empty
    pub fn drain(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.entries)
    }
}

/// Serde helper for payload bytes as `0x`-prefixed hex
mod hex_payload {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preserves_order() {
        let mut log = EventLog::new();
        let holder = AccountId::new([1; 20]);

        log.emit(Event::Deposit {
            from: holder,
            value: 10,
        });
        log.emit(Event::Minted {
            holder,
            amount: 1400,
        });
        log.emit(Event::SwapClosed { total_issued: 1400 });

        let names: Vec<_> = log.iter().map(Event::name).collect();
        assert_eq!(names, ["Deposit", "Minted", "SwapClosed"]);
        assert_eq!(log.count_named("Minted"), 1);
    }

    #[test]
    fn test_drain_empties_log() {
        let mut log = EventLog::new();
        log.emit(Event::SpentTodayReset);
        assert_eq!(log.drain().len(), 1);
        assert!(log.is_empty());
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::ConfirmationRequired {
            operation: OperationId::new([7; 32]),
            initiator: AccountId::new([1; 20]),
            value: 0,
            to: AccountId::new([2; 20]),
            payload: vec![0xab, 0x34, 0x56],
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "confirmation_required");
        assert_eq!(json["payload"], "0xab3456");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}

//! Replay scripts
//!
//! A script names accounts by label and lists calls in order:
//!
//! ```json
//! {
//!   "start_time": 1497074400,
//!   "accounts": { "alice": "0x0101..", "dave": "0x0404.." },
//!   "contracts": ["dave"],
//!   "steps": [
//!     { "start_swap": { "caller": "alice" } },
//!     { "deposit": { "from": "dave", "value": 10 } },
//!     { "advance": { "seconds": 86400 } }
//!   ]
//! }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use warden_authority::{AuthorityCore, AuthorityError};
use warden_core::{
    AccountId, Amount, Clock, Event, InMemoryNetwork, ManualClock, OperationId, Timestamp,
    WardenConfig,
};
use warden_issuance::{IssuanceError, IssuanceLedger, SwapEngine};

/// Errors raised while loading or replaying a script
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Unknown account: {0}")]
    UnknownAccount(String),

    #[error("Invalid operation id: {0}")]
    InvalidOperation(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("No pending operation to target")]
    NoPendingOperation,

    #[error("Issuance ledger not configured")]
    IssuanceNotConfigured,

    #[error("Authority error: {0}")]
    Authority(#[from] AuthorityError),

    #[error("Issuance error: {0}")]
    Issuance(#[from] IssuanceError),

    #[error("Core error: {0}")]
    Core(#[from] warden_core::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Script parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScriptError>;

/// A scripted sequence of calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    /// Clock reading before the first step
    pub start_time: Timestamp,

    /// Label to hex account id
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,

    /// Accounts that hold executable logic
    #[serde(default)]
    pub contracts: Vec<String>,

    /// Accounts that refuse delivered calls
    #[serde(default)]
    pub refusing: Vec<String>,

    pub steps: Vec<Step>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// One scripted call; account fields take a label or a hex id
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Advance {
        seconds: u64,
    },
    Execute {
        caller: String,
        to: String,
        value: Amount,
        #[serde(default)]
        payload: String,
    },
    /// Defaults to the latest operation that required confirmation
    Confirm {
        caller: String,
        operation: Option<String>,
    },
    Revoke {
        caller: String,
        operation: Option<String>,
    },
    AddOwner {
        caller: String,
        owner: String,
    },
    RemoveOwner {
        caller: String,
        owner: String,
    },
    ChangeOwner {
        caller: String,
        from: String,
        to: String,
    },
    SetRequired {
        caller: String,
        required: u32,
    },
    SetDailyLimit {
        caller: String,
        limit: Amount,
    },
    ResetSpentToday {
        caller: String,
    },
    EmergencyStop {
        caller: String,
    },
    Teardown {
        caller: String,
        destination: String,
    },
    StartSwap {
        caller: String,
    },
    StopSwap {
        caller: String,
    },
    Deposit {
        from: String,
        value: Amount,
    },
    Transfer {
        from: String,
        to: String,
        value: Amount,
    },
    Approve {
        holder: String,
        spender: String,
        value: Amount,
    },
    TransferFrom {
        spender: String,
        from: String,
        to: String,
        value: Amount,
    },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Step::Advance { .. } => "advance",
            Step::Execute { .. } => "execute",
            Step::Confirm { .. } => "confirm",
            Step::Revoke { .. } => "revoke",
            Step::AddOwner { .. } => "add_owner",
            Step::RemoveOwner { .. } => "remove_owner",
            Step::ChangeOwner { .. } => "change_owner",
            Step::SetRequired { .. } => "set_required",
            Step::SetDailyLimit { .. } => "set_daily_limit",
            Step::ResetSpentToday { .. } => "reset_spent_today",
            Step::EmergencyStop { .. } => "emergency_stop",
            Step::Teardown { .. } => "teardown",
            Step::StartSwap { .. } => "start_swap",
            Step::StopSwap { .. } => "stop_swap",
            Step::Deposit { .. } => "deposit",
            Step::Transfer { .. } => "transfer",
            Step::Approve { .. } => "approve",
            Step::TransferFrom { .. } => "transfer_from",
        }
    }
}

/// What one step did
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub index: usize,
    pub kind: &'static str,
    pub at: Timestamp,
    pub events: Vec<Event>,
    /// Hard rejection, if the step was refused
    pub error: Option<String>,
}

/// An authority under replay
pub struct Replay {
    authority: AuthorityCore<InMemoryNetwork>,
    clock: ManualClock,
    labels: HashMap<String, AccountId>,
    names: HashMap<AccountId, String>,
    latest: Option<OperationId>,
}

impl Replay {
    /// Build the authority and install the swap engine under its creator
    pub fn new(config: &WardenConfig, script: &Script) -> Result<Self> {
        let mut labels = HashMap::with_capacity(script.accounts.len());
        let mut names = HashMap::with_capacity(script.accounts.len());
        for (label, hex_id) in &script.accounts {
            let id = AccountId::from_hex(hex_id)
                .map_err(|_| ScriptError::UnknownAccount(format!("{} = {}", label, hex_id)))?;
            labels.insert(label.clone(), id);
            names.insert(id, label.clone());
        }

        let resolve = |name: &str| -> Result<AccountId> {
            labels
                .get(name)
                .copied()
                .or_else(|| AccountId::from_hex(name).ok())
                .ok_or_else(|| ScriptError::UnknownAccount(name.to_string()))
        };

        let mut network = InMemoryNetwork::new();
        for name in &script.contracts {
            network.deploy_contract(resolve(name)?);
        }
        for name in &script.refusing {
            network.refuse_calls(resolve(name)?);
        }

        let clock = ManualClock::new(script.start_time);
        let mut authority =
            AuthorityCore::from_config(&config.authority, network, Arc::new(clock.clone()))?;
        let engine = SwapEngine::from_config(&config.swap)?;
        authority.configure_issuance(&config.authority.creator, engine)?;

        Ok(Self {
            authority,
            clock,
            labels,
            names,
            latest: None,
        })
    }

    pub fn authority(&self) -> &AuthorityCore<InMemoryNetwork> {
        &self.authority
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Label for an account, or its short hex form
    pub fn name_of(&self, account: &AccountId) -> String {
        self.names
            .get(account)
            .cloned()
            .unwrap_or_else(|| account.short())
    }

    pub fn resolve(&self, name: &str) -> Result<AccountId> {
        if let Some(id) = self.labels.get(name) {
            return Ok(*id);
        }
        AccountId::from_hex(name).map_err(|_| ScriptError::UnknownAccount(name.to_string()))
    }

    /// Run every step; a refused step is recorded and replay continues
    pub fn run(&mut self, steps: &[Step]) -> Vec<StepRecord> {
        steps
            .iter()
            .enumerate()
            .map(|(index, step)| self.run_step(index, step))
            .collect()
    }

    pub fn run_step(&mut self, index: usize, step: &Step) -> StepRecord {
        let error = match self.apply(step) {
            Ok(()) => None,
            Err(e) => {
                warn!(step = index, kind = step.kind(), error = %e, "step rejected");
                Some(e.to_string())
            }
        };

        let mut events = self.authority.drain_events();
        if let Some(ledger) = self.authority.ledger_mut() {
            events.extend(ledger.drain_events());
        }
        if let Some(operation) = events.iter().rev().find_map(|event| match event {
            Event::ConfirmationRequired { operation, .. } => Some(*operation),
            _ => None,
        }) {
            self.latest = Some(operation);
        }

        StepRecord {
            index,
            kind: step.kind(),
            at: self.now(),
            events,
            error,
        }
    }

    fn apply(&mut self, step: &Step) -> Result<()> {
        debug!(kind = step.kind(), "applying step");
        match step {
            Step::Advance { seconds } => self.clock.advance(*seconds),
            Step::Execute {
                caller,
                to,
                value,
                payload,
            } => {
                let payload = decode_payload(payload)?;
                let (caller, to) = (self.resolve(caller)?, self.resolve(to)?);
                self.authority
                    .request_or_execute(&caller, &to, *value, &payload)?;
            }
            Step::Confirm { caller, operation } => {
                let caller = self.resolve(caller)?;
                let id = self.target_operation(operation.as_deref())?;
                self.authority.confirm(&caller, &id)?;
            }
            Step::Revoke { caller, operation } => {
                let caller = self.resolve(caller)?;
                let id = self.target_operation(operation.as_deref())?;
                self.authority.revoke(&caller, &id)?;
            }
            Step::AddOwner { caller, owner } => {
                let (caller, owner) = (self.resolve(caller)?, self.resolve(owner)?);
                self.authority.add_owner(&caller, owner)?;
            }
            Step::RemoveOwner { caller, owner } => {
                let (caller, owner) = (self.resolve(caller)?, self.resolve(owner)?);
                self.authority.remove_owner(&caller, owner)?;
            }
            Step::ChangeOwner { caller, from, to } => {
                let caller = self.resolve(caller)?;
                let (from, to) = (self.resolve(from)?, self.resolve(to)?);
                self.authority.change_owner(&caller, from, to)?;
            }
            Step::SetRequired { caller, required } => {
                let caller = self.resolve(caller)?;
                self.authority
                    .set_required_confirmations(&caller, *required)?;
            }
            Step::SetDailyLimit { caller, limit } => {
                let caller = self.resolve(caller)?;
                self.authority.set_daily_limit(&caller, *limit)?;
            }
            Step::ResetSpentToday { caller } => {
                let caller = self.resolve(caller)?;
                self.authority.reset_spent_today(&caller)?;
            }
            Step::EmergencyStop { caller } => {
                let caller = self.resolve(caller)?;
                self.authority.activate_emergency_stop(&caller)?;
            }
            Step::Teardown {
                caller,
                destination,
            } => {
                let (caller, destination) = (self.resolve(caller)?, self.resolve(destination)?);
                self.authority.teardown(&caller, destination)?;
            }
            Step::StartSwap { caller } => {
                let caller = self.resolve(caller)?;
                self.authority.start_swap_window(&caller)?;
            }
            Step::StopSwap { caller } => {
                let caller = self.resolve(caller)?;
                self.authority.stop_swap_window(&caller)?;
            }
            Step::Deposit { from, value } => {
                let from = self.resolve(from)?;
                self.authority.accept_deposit(&from, *value)?;
            }
            Step::Transfer { from, to, value } => {
                let (from, to) = (self.resolve(from)?, self.resolve(to)?);
                self.ledger_mut()?.transfer(&from, &to, *value)?;
            }
            Step::Approve {
                holder,
                spender,
                value,
            } => {
                let (holder, spender) = (self.resolve(holder)?, self.resolve(spender)?);
                self.ledger_mut()?.approve(&holder, &spender, *value)?;
            }
            Step::TransferFrom {
                spender,
                from,
                to,
                value,
            } => {
                let spender = self.resolve(spender)?;
                let (from, to) = (self.resolve(from)?, self.resolve(to)?);
                self.ledger_mut()?
                    .transfer_from(&spender, &from, &to, *value)?;
            }
        }
        Ok(())
    }

    fn target_operation(&self, explicit: Option<&str>) -> Result<OperationId> {
        match explicit {
            Some(hex_id) => OperationId::from_hex(hex_id)
                .map_err(|_| ScriptError::InvalidOperation(hex_id.to_string())),
            None => self.latest.ok_or(ScriptError::NoPendingOperation),
        }
    }

    fn ledger_mut(&mut self) -> Result<&mut IssuanceLedger> {
        self.authority
            .ledger_mut()
            .ok_or(ScriptError::IssuanceNotConfigured)
    }
}

fn decode_payload(payload: &str) -> Result<Vec<u8>> {
    hex::decode(payload.trim_start_matches("0x"))
        .map_err(|e| ScriptError::InvalidPayload(e.to_string()))
}

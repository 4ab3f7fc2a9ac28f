//! The M-of-N authority
//!
//! Every entry point takes `&mut self` and either commits in full or returns
//! `Err` with no state change. Unauthorized or redundant calls are not
//! errors: they return an `Ignored` outcome and leave no trace beyond a
//! debug log line.

use std::sync::Arc;

use tracing::{debug, info, warn};
use warden_core::{
    day_index, AccountId, Amount, AuthorityConfig, Clock, Event, EventLog, Network, OperationId,
    SystemClock,
};
use warden_issuance::{IssuanceLedger, MintReceipt, SwapEngine};

use crate::daily_limit::DailyLimit;
use crate::error::{AuthorityError, Result};
use crate::mutations::{Mutation, PendingMutation, PendingMutationRegistry};
use crate::operations::{PendingOperation, PendingOperationRegistry};
use crate::owners::OwnerSet;

/// Outcome of a value-transfer request or confirmation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Caller not an owner, unknown id, or a repeated confirmation
    Ignored,
    /// Paid out under the daily limit
    SimpleExecuted,
    /// Waiting for more confirmations
    Pending {
        operation: OperationId,
        confirmations: usize,
    },
    /// Threshold reached and paid out
    Executed { operation: OperationId },
}

/// Outcome of a configuration mutation vote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Caller not an owner, repeated vote, or arguments not admissible
    Ignored,
    /// Vote recorded; `confirmations` counts the caller's
    Pending {
        operation: OperationId,
        confirmations: usize,
    },
    /// Threshold reached and the mutation took effect
    Applied { operation: OperationId },
}

/// Owner set, confirmation protocol and daily limit, plus the deposit path
/// into the swap engine
pub struct AuthorityCore<N: Network> {
    address: AccountId,
    owners: OwnerSet,
    required: u32,
    daily_limit: DailyLimit,
    operations: PendingOperationRegistry,
    mutations: PendingMutationRegistry,
    emergency_stop: bool,
    decommissioned: bool,
    held_value: Amount,
    issuance: Option<SwapEngine>,
    network: N,
    clock: Arc<dyn Clock>,
    events: EventLog,
}

impl<N: Network> AuthorityCore<N> {
    /// Create an authority; `creator` becomes an owner alongside `owners`
    pub fn create(
        creator: AccountId,
        owners: &[AccountId],
        required: u32,
        daily_limit: Amount,
        network: N,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let config = AuthorityConfig {
            creator,
            owners: owners.to_vec(),
            required,
            daily_limit,
        };
        Self::from_config(&config, network, clock)
    }

    /// Create an authority on the wall clock
    pub fn with_system_clock(config: &AuthorityConfig, network: N) -> Result<Self> {
        Self::from_config(config, network, Arc::new(SystemClock))
    }

    /// Create an authority from a validated configuration
    pub fn from_config(config: &AuthorityConfig, network: N, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let address = AccountId::for_authority(
            &config.creator,
            &config.owners,
            config.required,
            config.daily_limit,
        );
        let owners = OwnerSet::from_unique(config.all_owners());
        let today = day_index(clock.now());

        info!(
            address = %address,
            owners = owners.len(),
            required = config.required,
            daily_limit = config.daily_limit,
            "authority created"
        );

        Ok(Self {
            address,
            owners,
            required: config.required,
            daily_limit: DailyLimit::new(config.daily_limit, today),
            operations: PendingOperationRegistry::new(),
            mutations: PendingMutationRegistry::new(),
            emergency_stop: false,
            decommissioned: false,
            held_value: 0,
            issuance: None,
            network,
            clock,
            events: EventLog::new(),
        })
    }

    // === Value transfers ===

    /// Move held value to `to`, alone under the daily limit or by confirmation
    pub fn request_or_execute(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        value: Amount,
        payload: &[u8],
    ) -> Result<RequestOutcome> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "request from non-owner ignored");
            return Ok(RequestOutcome::Ignored);
        }

        if payload.is_empty() && !self.network.has_code(to) {
            let mut limit = self.daily_limit;
            if limit.try_spend(value, self.today()) {
                self.pay_out(to, value, payload)?;
                self.daily_limit = limit;
                self.events.emit(Event::SimpleExecuted {
                    owner: *caller,
                    value,
                    to: *to,
                    payload: Vec::new(),
                });
                info!(to = %to.short(), value, "executed under daily limit");
                return Ok(RequestOutcome::SimpleExecuted);
            }
        }

        let id = self.operations.next_id(&self.address, to, value, payload);

        if self.required <= 1 {
            self.pay_out(to, value, payload)?;
            self.operations.advance_sequence();
            self.events.emit(Event::Executed {
                owner: *caller,
                operation: id,
                value,
                to: *to,
                payload: payload.to_vec(),
            });
            info!(operation = %id.short(), to = %to.short(), value, "executed");
            return Ok(RequestOutcome::Executed { operation: id });
        }

        let pending = PendingOperation::new(
            id,
            *caller,
            *to,
            value,
            payload.to_vec(),
            self.operations.sequence(),
        );
        self.operations.insert(pending);
        self.operations.advance_sequence();
        self.events.emit(Event::ConfirmationRequired {
            operation: id,
            initiator: *caller,
            value,
            to: *to,
            payload: payload.to_vec(),
        });
        info!(operation = %id.short(), to = %to.short(), value, "confirmation required");

        Ok(RequestOutcome::Pending {
            operation: id,
            confirmations: 1,
        })
    }

    /// Add `caller`'s confirmation to a pending transfer
    pub fn confirm(&mut self, caller: &AccountId, id: &OperationId) -> Result<RequestOutcome> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "confirmation from non-owner ignored");
            return Ok(RequestOutcome::Ignored);
        }

        let pending = match self.operations.get(id) {
            Some(pending) => pending,
            None => {
                debug!(operation = %id.short(), "confirmation for unknown operation ignored");
                return Ok(RequestOutcome::Ignored);
            }
        };
        if pending.has_confirmed(caller) {
            debug!(operation = %id.short(), caller = %caller.short(), "repeated confirmation ignored");
            return Ok(RequestOutcome::Ignored);
        }

        let confirmations = pending.confirmation_count() + 1;
        if confirmations < self.required as usize {
            if let Some(pending) = self.operations.get_mut(id) {
                pending.confirm(*caller);
            }
            self.events.emit(Event::Confirmed {
                owner: *caller,
                operation: *id,
            });
            return Ok(RequestOutcome::Pending {
                operation: *id,
                confirmations,
            });
        }

        let (to, value, payload) = (pending.to, pending.value, pending.payload.clone());
        self.pay_out(&to, value, &payload)?;
        self.operations.remove(id);
        self.events.extend([
            Event::Confirmed {
                owner: *caller,
                operation: *id,
            },
            Event::Executed {
                owner: *caller,
                operation: *id,
                value,
                to,
                payload,
            },
        ]);
        info!(operation = %id.short(), to = %to.short(), value, "executed");

        Ok(RequestOutcome::Executed { operation: *id })
    }

    /// Withdraw `caller`'s confirmation; the entry itself stays pending
    ///
    /// Returns true if a confirmation was removed.
    pub fn revoke(&mut self, caller: &AccountId, id: &OperationId) -> Result<bool> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "revoke from non-owner ignored");
            return Ok(false);
        }

        let removed = self
            .operations
            .get_mut(id)
            .map(|pending| pending.revoke(caller))
            .unwrap_or(false);

        if removed {
            self.events.emit(Event::Revoked {
                owner: *caller,
                operation: *id,
            });
        } else {
            debug!(operation = %id.short(), caller = %caller.short(), "nothing to revoke");
        }
        Ok(removed)
    }

    // === Configuration mutations ===

    /// Vote to add `owner`
    pub fn add_owner(&mut self, caller: &AccountId, owner: AccountId) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::AddOwner(owner))
    }

    /// Vote to remove `owner`; ignored if fewer than `required` would remain
    pub fn remove_owner(&mut self, caller: &AccountId, owner: AccountId) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::RemoveOwner(owner))
    }

    /// Vote to replace `from` with `to` in the same slot
    pub fn change_owner(
        &mut self,
        caller: &AccountId,
        from: AccountId,
        to: AccountId,
    ) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::ChangeOwner { from, to })
    }

    /// Vote for a new confirmation threshold
    pub fn set_required_confirmations(
        &mut self,
        caller: &AccountId,
        required: u32,
    ) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::SetThreshold(required))
    }

    /// Vote for a new daily spend ceiling
    pub fn set_daily_limit(&mut self, caller: &AccountId, limit: Amount) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::SetDailyLimit(limit))
    }

    /// Vote to zero today's spend
    pub fn reset_spent_today(&mut self, caller: &AccountId) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::ResetSpend)
    }

    /// Vote to halt deposits for good
    pub fn activate_emergency_stop(&mut self, caller: &AccountId) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::ActivateEmergencyStop)
    }

    /// Release all held value to `destination` and shut down for good
    ///
    /// The vote that would apply it fails with `EmergencyStopInactive` unless
    /// the emergency stop is already active.
    pub fn teardown(&mut self, caller: &AccountId, destination: AccountId) -> Result<MutationOutcome> {
        self.propose(caller, Mutation::Teardown { destination })
    }

    /// Vote for `mutation`, applying it once the threshold is reached
    pub fn propose(&mut self, caller: &AccountId, mutation: Mutation) -> Result<MutationOutcome> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), mutation = mutation.kind(), "mutation from non-owner ignored");
            return Ok(MutationOutcome::Ignored);
        }
        if let Some(reason) = self.inadmissible(&mutation) {
            debug!(mutation = mutation.kind(), reason, "mutation ignored");
            return Ok(MutationOutcome::Ignored);
        }

        let id = mutation.id(&self.address);
        let existing = self.mutations.get(&mutation);
        if existing.is_some_and(|pending| pending.has_confirmed(caller)) {
            debug!(mutation = mutation.kind(), caller = %caller.short(), "repeated vote ignored");
            return Ok(MutationOutcome::Ignored);
        }

        let confirmations = existing.map_or(0, PendingMutation::confirmation_count) + 1;
        if confirmations < self.required as usize {
            self.mutations.vote(&mutation, id, *caller);
            self.events.emit(Event::Confirmed {
                owner: *caller,
                operation: id,
            });
            return Ok(MutationOutcome::Pending {
                operation: id,
                confirmations,
            });
        }

        let mut staged = Vec::with_capacity(2);
        if self.required > 1 {
            staged.push(Event::Confirmed {
                owner: *caller,
                operation: id,
            });
        }
        self.apply(&mutation, &mut staged)?;

        self.mutations.remove(&mutation);
        if mutation.changes_membership() {
            self.clear_pending();
        }
        self.events.extend(staged);
        info!(mutation = mutation.kind(), operation = %id.short(), "mutation applied");

        Ok(MutationOutcome::Applied { operation: id })
    }

    /// Why `mutation` cannot be voted for right now, if it cannot
    fn inadmissible(&self, mutation: &Mutation) -> Option<&'static str> {
        match mutation {
            Mutation::AddOwner(account) => {
                if *account == AccountId::ZERO {
                    Some("zero account")
                } else if self.owners.contains(account) {
                    Some("already an owner")
                } else if self.owners.is_full() {
                    Some("owner set full")
                } else {
                    None
                }
            }
            Mutation::RemoveOwner(account) => {
                if !self.owners.contains(account) {
                    Some("not an owner")
                } else if self.owners.len() - 1 < self.required as usize {
                    Some("would leave fewer owners than required")
                } else {
                    None
                }
            }
            Mutation::ChangeOwner { from, to } => {
                if !self.owners.contains(from) {
                    Some("not an owner")
                } else if *to == AccountId::ZERO {
                    Some("zero account")
                } else if self.owners.contains(to) {
                    Some("already an owner")
                } else {
                    None
                }
            }
            Mutation::SetThreshold(required) => {
                if *required == 0 || *required as usize > self.owners.len() {
                    Some("threshold out of range")
                } else {
                    None
                }
            }
            Mutation::ActivateEmergencyStop if self.emergency_stop => Some("already active"),
            _ => None,
        }
    }

    /// Apply an admissible mutation, staging its event
    ///
    /// Only teardown can fail, and it fails before touching any state.
    fn apply(&mut self, mutation: &Mutation, staged: &mut Vec<Event>) -> Result<()> {
        match mutation {
            Mutation::AddOwner(account) => {
                self.owners.add(*account);
                staged.push(Event::OwnerAdded {
                    new_owner: *account,
                });
            }
            Mutation::RemoveOwner(account) => {
                self.owners.remove(account);
                staged.push(Event::OwnerRemoved {
                    old_owner: *account,
                });
            }
            Mutation::ChangeOwner { from, to } => {
                self.owners.replace(from, *to);
                staged.push(Event::OwnerChanged {
                    old_owner: *from,
                    new_owner: *to,
                });
            }
            Mutation::SetThreshold(required) => {
                self.required = *required;
                staged.push(Event::RequirementChanged {
                    new_requirement: *required,
                });
            }
            Mutation::SetDailyLimit(limit) => {
                self.daily_limit.set_limit(*limit);
                staged.push(Event::DailyLimitChanged { new_limit: *limit });
            }
            Mutation::ResetSpend => {
                self.daily_limit.reset();
                staged.push(Event::SpentTodayReset);
            }
            Mutation::ActivateEmergencyStop => {
                self.emergency_stop = true;
                if let Some(engine) = self.issuance.as_mut() {
                    engine.halt();
                }
                warn!(address = %self.address, "emergency stop activated");
                staged.push(Event::EmergencyStopActivated);
            }
            Mutation::Teardown { destination } => {
                if !self.emergency_stop {
                    warn!(address = %self.address, "teardown refused: emergency stop inactive");
                    return Err(AuthorityError::EmergencyStopInactive);
                }
                let value = self.held_value;
                self.pay_out(destination, value, &[])?;
                self.decommissioned = true;
                self.clear_pending();
                warn!(address = %self.address, destination = %destination, value, "authority decommissioned");
                staged.push(Event::Decommissioned {
                    destination: *destination,
                    value,
                });
            }
        }
        Ok(())
    }

    // === Swap window and deposits ===

    /// Install the swap engine; only the first installation takes effect
    pub fn configure_issuance(&mut self, caller: &AccountId, mut engine: SwapEngine) -> Result<bool> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "issuance configuration from non-owner ignored");
            return Ok(false);
        }
        if self.issuance.is_some() {
            debug!("issuance already configured");
            return Ok(false);
        }

        if self.emergency_stop {
            engine.halt();
        }
        info!(cap = engine.ledger().cap(), "issuance configured");
        self.issuance = Some(engine);
        Ok(true)
    }

    /// Open the swap window at the current clock reading
    pub fn start_swap_window(&mut self, caller: &AccountId) -> Result<bool> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "swap start from non-owner ignored");
            return Ok(false);
        }

        let now = self.clock.now();
        let engine = self
            .issuance
            .as_mut()
            .ok_or(AuthorityError::IssuanceNotConfigured)?;
        if let Err(e) = engine.start(now) {
            debug!(error = %e, "swap start ignored");
            return Ok(false);
        }
        self.events.emit(Event::SwapStarted { at: now });
        Ok(true)
    }

    /// Close the swap window ahead of schedule
    pub fn stop_swap_window(&mut self, caller: &AccountId) -> Result<bool> {
        self.ensure_live()?;
        if !self.owners.contains(caller) {
            debug!(caller = %caller.short(), "swap stop from non-owner ignored");
            return Ok(false);
        }

        let engine = self
            .issuance
            .as_mut()
            .ok_or(AuthorityError::IssuanceNotConfigured)?;
        if let Err(e) = engine.stop() {
            debug!(error = %e, "swap stop ignored");
            return Ok(false);
        }
        self.events.emit(Event::SwapStopped);
        Ok(true)
    }

    /// Take `value` from `depositor` and mint through the swap engine
    ///
    /// Any rejection refuses the whole deposit: held value and the ledger are
    /// left as they were.
    pub fn accept_deposit(&mut self, depositor: &AccountId, value: Amount) -> Result<MintReceipt> {
        self.ensure_live()?;
        if value == 0 {
            return Err(AuthorityError::ZeroDeposit);
        }
        if self.emergency_stop {
            warn!(depositor = %depositor.short(), value, "deposit refused during emergency stop");
            return Err(AuthorityError::EmergencyStopActive);
        }

        let held = self
            .held_value
            .checked_add(value)
            .ok_or(AuthorityError::Overflow)?;
        let now = self.clock.now();
        let engine = self
            .issuance
            .as_mut()
            .ok_or(AuthorityError::IssuanceNotConfigured)?;
        let receipt = engine.on_deposit(depositor, value, now)?;

        self.held_value = held;
        self.events.emit(Event::Deposit {
            from: *depositor,
            value,
        });
        self.events.emit(Event::Minted {
            holder: *depositor,
            amount: receipt.issued,
        });
        if receipt.swap_closed {
            self.events.emit(Event::SwapClosed {
                total_issued: receipt.total_issued,
            });
        }

        Ok(receipt)
    }

    // === Queries ===

    /// Address derived from the creation parameters
    pub fn address(&self) -> AccountId {
        self.address
    }

    /// Number of owners
    pub fn owner_count(&self) -> usize {
        self.owners.len()
    }

    /// Confirmations needed for a multisig transfer or mutation
    pub fn required(&self) -> u32 {
        self.required
    }

    /// Daily spend ceiling on the single-owner path
    pub fn daily_limit(&self) -> Amount {
        self.daily_limit.limit()
    }

    /// Spent today, as of the current clock reading
    pub fn spent_today(&self) -> Amount {
        self.daily_limit.spent_on(self.today())
    }

    /// Headroom left under the daily limit today
    pub fn remaining_today(&self) -> Amount {
        self.daily_limit.remaining_on(self.today())
    }

    /// Check whether `account` is an owner
    pub fn is_owner(&self, account: &AccountId) -> bool {
        self.owners.contains(account)
    }

    /// Owner at `index`, in insertion order
    pub fn owner_at(&self, index: usize) -> Option<AccountId> {
        self.owners.get(index).copied()
    }

    /// All owners, in insertion order
    pub fn owners(&self) -> &[AccountId] {
        self.owners.as_slice()
    }

    /// Value held for payouts
    pub fn held_value(&self) -> Amount {
        self.held_value
    }

    /// Check whether the emergency stop has been applied
    pub fn emergency_stop_active(&self) -> bool {
        self.emergency_stop
    }

    /// Check whether teardown has been applied
    pub fn is_decommissioned(&self) -> bool {
        self.decommissioned
    }

    /// Zero until an engine is installed
    pub fn total_issued(&self) -> Amount {
        self.issuance
            .as_ref()
            .map_or(0, |engine| engine.ledger().total_issued())
    }

    /// Locked until an engine is installed and its cap is crossed
    pub fn transfer_locked(&self) -> bool {
        self.issuance
            .as_ref()
            .map_or(true, |engine| engine.ledger().transfer_locked())
    }

    /// Pending value transfer by id
    pub fn pending_operation(&self, id: &OperationId) -> Option<&PendingOperation> {
        self.operations.get(id)
    }

    /// Pending vote for `mutation`, if any owner has cast one
    pub fn pending_mutation(&self, mutation: &Mutation) -> Option<&PendingMutation> {
        self.mutations.get(mutation)
    }

    /// Number of pending value transfers
    pub fn pending_operations(&self) -> usize {
        self.operations.len()
    }

    /// Number of pending mutations
    pub fn pending_mutations(&self) -> usize {
        self.mutations.len()
    }

    /// Authority events in emission order
    ///
    /// The log grows with every committed call until drained with
    /// [`AuthorityCore::drain_events`].
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take every authority event, leaving the log empty
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    /// Installed swap engine, read-only
    pub fn issuance(&self) -> Option<&SwapEngine> {
        self.issuance.as_ref()
    }

    /// Ledger access for token holders
    ///
    /// Window control stays behind the owner-gated calls above.
    pub fn ledger_mut(&mut self) -> Option<&mut IssuanceLedger> {
        self.issuance.as_mut().map(SwapEngine::ledger_mut)
    }

    /// Network the authority pays out on
    pub fn network(&self) -> &N {
        &self.network
    }

    // === Internals ===

    fn today(&self) -> u64 {
        day_index(self.clock.now())
    }

    fn ensure_live(&self) -> Result<()> {
        if self.decommissioned {
            return Err(AuthorityError::Decommissioned);
        }
        Ok(())
    }

    /// Deliver held value; all-or-nothing
    fn pay_out(&mut self, to: &AccountId, value: Amount, payload: &[u8]) -> Result<()> {
        if value > self.held_value {
            return Err(warden_core::Error::InsufficientFunds {
                needed: value,
                available: self.held_value,
            }
            .into());
        }
        self.network.deliver(to, value, payload)?;
        self.held_value -= value;
        Ok(())
    }

    fn clear_pending(&mut self) {
        if !self.operations.is_empty() || !self.mutations.is_empty() {
            debug!(
                operations = self.operations.len(),
                mutations = self.mutations.len(),
                "clearing pending state"
            );
        }
        self.operations.clear();
        self.mutations.clear();
    }
}

//! Ledger engine: supply bookkeeping, authorization and transfers
//!
//! # Example
//!
//! ```
//! use asset_ledger::{AccountId, InMemoryContext, Ledger};
//!
//! # fn main() -> asset_ledger::Result<()> {
//! let owner = AccountId::new("owner");
//! let alice = AccountId::new("alice");
//! let bob = AccountId::new("bob");
//! let context = InMemoryContext::new();
//!
//! let mut ledger = Ledger::new("CLR", "Asset Token", owner.clone());
//! ledger.fund(&owner, &alice, 100)?;
//! ledger.transfer(&context, &alice, &bob, 50)?;
//!
//! assert_eq!(ledger.balance_of(&alice), 50);
//! assert_eq!(ledger.balance_of(&bob), 50);
//! assert_eq!(ledger.total_supply(), 100);
//! # Ok(())
//! # }
//! ```
//!
//! # Transfer state machine
//!
//! ```text
//! caller == owner?      ──yes──► OwnerCannotTransfer
//! recipient == owner?   ──yes──► OwnerCannotReceive
//! balance < amount?     ──yes──► InsufficientBalance
//! debit, credit, append Transfer
//! classify recipient
//!   Account             ──────► committed
//!   Receiver            ──────► committed, then on_token_received
//!   Receiver, too deep  ──────► revert ──► ReentrancyLimit
//!   Contract            ──────► revert ──► RecipientRejected
//! ```
//!
//! # Re-entry
//!
//! A receiver hook never sees the [`Ledger`] itself. It gets a
//! [`ReentrantLedger`] whose caller is pinned to the receiving contract, so a
//! hook can spend what it holds but cannot debit the sender or mint.

use crate::{
    context::{ExecutionContext, Recipient},
    events::{EventRecord, EventSink, MemoryEventSink},
    metrics::Metrics,
    types::{
        AccountId, Acknowledgment, Amount, FundReceipt, TokenInfo, TransferEvent,
        TransferReceipt,
    },
    config::TokenConfig,
    Error, Result,
};
use std::collections::HashMap;
use std::fmt;

/// Maximum number of receiver hooks running inside one another
pub const MAX_HOOK_DEPTH: usize = 8;

/// Fungible asset ledger
pub struct Ledger {
    /// Symbol, name and owner (immutable)
    info: TokenInfo,

    /// Sum of all balances
    total_supply: Amount,

    /// Non-zero balances; absent accounts hold 0
    balances: HashMap<AccountId, Amount>,

    /// Destination for `Transfer` records
    sink: Box<dyn EventSink>,

    /// Prometheus collectors (if enabled)
    metrics: Option<Metrics>,

    /// Receiver hooks currently on the stack
    hook_depth: usize,
}

/// Pre-transfer values restored when a transfer is aborted
struct Checkpoint {
    sender: (AccountId, Amount),
    recipient: (AccountId, Amount),
    events_len: u64,
}

impl Ledger {
    /// Construct a ledger owned by `caller`, recording into a [`MemoryEventSink`]
    pub fn new(symbol: impl Into<String>, name: impl Into<String>, caller: AccountId) -> Self {
        Self::with_sink(symbol, name, caller, Box::new(MemoryEventSink::new()))
    }

    /// Construct a ledger recording into `sink`
    pub fn with_sink(
        symbol: impl Into<String>,
        name: impl Into<String>,
        caller: AccountId,
        sink: Box<dyn EventSink>,
    ) -> Self {
        let info = TokenInfo {
            symbol: symbol.into(),
            name: name.into(),
            owner: caller,
        };

        tracing::info!(
            symbol = %info.symbol,
            name = %info.name,
            owner = %info.owner,
            "Ledger constructed"
        );

        Self {
            info,
            total_supply: 0,
            balances: HashMap::new(),
            sink,
            metrics: None,
            hook_depth: 0,
        }
    }

    /// Construct from the token section of a [`crate::Config`]
    pub fn from_config(config: &TokenConfig) -> Self {
        let info = config.token_info();
        Self::new(info.symbol, info.name, info.owner)
    }

    /// Attach Prometheus collectors
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        metrics.update_total_supply(self.total_supply);
        self.metrics = Some(metrics);
        self
    }

    /// Minting authority
    pub fn owner(&self) -> &AccountId {
        &self.info.owner
    }

    /// Token name
    pub fn name(&self) -> &str {
        &self.info.name
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.info.symbol
    }

    /// Symbol, name and owner
    pub fn token_info(&self) -> &TokenInfo {
        &self.info
    }

    /// Total units in existence
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `account` (0 if never funded)
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Accounts holding a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&AccountId, Amount)> + '_ {
        self.balances.iter().map(|(account, balance)| (account, *balance))
    }

    /// `Transfer` records with `from <= sequence <= to`; `to = None` means latest
    pub fn events(&self, from: u64, to: Option<u64>) -> Vec<EventRecord> {
        self.sink.range(from, to)
    }

    /// The event sink
    pub fn sink(&self) -> &dyn EventSink {
        self.sink.as_ref()
    }

    /// Mint `amount` units into `target`. Owner only; emits no event.
    pub fn fund(
        &mut self,
        caller: &AccountId,
        target: &AccountId,
        amount: Amount,
    ) -> Result<FundReceipt> {
        if caller != &self.info.owner {
            return Err(self.reject(Error::Unauthorized));
        }

        let total_supply = match self.total_supply.checked_add(amount) {
            Some(total) => total,
            None => {
                return Err(self.reject(Error::Overflow(format!(
                    "total supply {} + {}",
                    self.total_supply, amount
                ))))
            }
        };

        // Bounded by total supply, so this only fails if the invariant is already broken
        let balance = match self.balance_of(target).checked_add(amount) {
            Some(balance) => balance,
            None => {
                return Err(self.reject(Error::Overflow(format!(
                    "balance of {} + {}",
                    target, amount
                ))))
            }
        };

        self.set_balance(target, balance);
        self.total_supply = total_supply;

        tracing::info!(%target, amount, balance, total_supply, "Account funded");

        if let Some(ref metrics) = self.metrics {
            metrics.record_fund(total_supply);
        }

        Ok(FundReceipt {
            target: target.clone(),
            amount,
            balance,
            total_supply,
        })
    }

    /// Transfer without attached data; the receiver hook sees `None`
    pub fn transfer(
        &mut self,
        context: &dyn ExecutionContext,
        caller: &AccountId,
        recipient: &AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        self.transfer_with_data(context, caller, recipient, amount, None)
    }

    /// Transfer `amount` units from `caller` to `recipient`.
    ///
    /// Balances are updated and the `Transfer` event appended before the
    /// recipient's hook runs, so a re-entrant hook observes the committed
    /// transfer. A failing hook does not undo the transfer.
    pub fn transfer_with_data(
        &mut self,
        context: &dyn ExecutionContext,
        caller: &AccountId,
        recipient: &AccountId,
        amount: Amount,
        data: Option<&[u8]>,
    ) -> Result<TransferReceipt> {
        if caller == &self.info.owner {
            return Err(self.reject(Error::OwnerCannotTransfer));
        }
        if recipient == &self.info.owner {
            return Err(self.reject(Error::OwnerCannotReceive));
        }

        let available = self.balance_of(caller);
        if available < amount {
            return Err(self.reject(Error::InsufficientBalance {
                required: amount,
                available,
            }));
        }

        let checkpoint = Checkpoint {
            sender: (caller.clone(), available),
            recipient: (recipient.clone(), self.balance_of(recipient)),
            events_len: self.sink.len(),
        };

        self.set_balance(caller, available - amount);
        let credited = match self.balance_of(recipient).checked_add(amount) {
            Some(balance) => balance,
            None => {
                self.revert(checkpoint);
                return Err(self.reject(Error::Overflow(format!(
                    "balance of {} + {}",
                    recipient, amount
                ))));
            }
        };
        self.set_balance(recipient, credited);

        let event = TransferEvent {
            from: caller.clone(),
            to: recipient.clone(),
            value: amount,
        };
        let sequence = match self.sink.append(event.clone()) {
            Ok(sequence) => sequence,
            Err(e) => {
                self.revert(checkpoint);
                return Err(self.reject(e));
            }
        };

        let classification = context.classify(recipient);
        match classification {
            Recipient::Contract => {
                self.revert(checkpoint);
                tracing::warn!(%recipient, "Contract recipient has no receiver hook");
                return Err(self.reject(Error::RecipientRejected(recipient.to_string())));
            }
            Recipient::Receiver(_) if self.hook_depth >= MAX_HOOK_DEPTH => {
                self.revert(checkpoint);
                tracing::warn!(
                    %recipient,
                    depth = self.hook_depth,
                    "Receiver hooks nested too deeply"
                );
                return Err(self.reject(Error::ReentrancyLimit(self.hook_depth)));
            }
            _ => {}
        }

        tracing::info!(
            sequence,
            from = %caller,
            to = %recipient,
            value = amount,
            recipient_kind = classification.label(),
            "Transfer committed"
        );

        if let Some(ref metrics) = self.metrics {
            metrics.record_transfer();
        }

        let acknowledgment = match classification {
            Recipient::Receiver(receiver) => {
                self.hook_depth += 1;
                let outcome = receiver.on_token_received(
                    &mut ReentrantLedger::new(self, context, recipient.clone()),
                    caller,
                    amount,
                    data,
                );
                self.hook_depth -= 1;

                match outcome {
                    Ok(()) => {
                        tracing::debug!(sequence, %recipient, "Transfer acknowledged");
                        self.record_acknowledgment("accepted");
                        Acknowledgment::Accepted
                    }
                    Err(e) => {
                        tracing::warn!(
                            sequence,
                            %recipient,
                            error = %e,
                            "Receiver hook failed, transfer stands"
                        );
                        self.record_acknowledgment("failed");
                        Acknowledgment::Failed(e.to_string())
                    }
                }
            }
            _ => Acknowledgment::NotRequired,
        };

        Ok(TransferReceipt {
            sequence,
            event,
            acknowledgment,
        })
    }

    /// Check money conservation: total supply equals the sum of all balances
    pub fn check_supply_invariant(&self) -> bool {
        self.balances
            .values()
            .try_fold(0u128, |acc, balance| acc.checked_add(*balance))
            == Some(self.total_supply)
    }

    fn set_balance(&mut self, account: &AccountId, balance: Amount) {
        if balance == 0 {
            self.balances.remove(account);
        } else {
            self.balances.insert(account.clone(), balance);
        }
    }

    fn revert(&mut self, checkpoint: Checkpoint) {
        // Recipient first: for a self-transfer both entries hold the same value
        self.set_balance(&checkpoint.recipient.0, checkpoint.recipient.1);
        self.set_balance(&checkpoint.sender.0, checkpoint.sender.1);
        self.sink.truncate(checkpoint.events_len);
    }

    fn reject(&self, err: Error) -> Error {
        tracing::debug!(kind = err.kind(), error = %err, "Invocation rejected");
        if let Some(ref metrics) = self.metrics {
            metrics.record_rejection(err.kind());
        }
        err
    }

    fn record_acknowledgment(&self, outcome: &str) {
        if let Some(ref metrics) = self.metrics {
            metrics.record_acknowledgment(outcome);
        }
    }
}

/// Ledger view handed to a receiver hook.
///
/// Every mutating call is made on behalf of the receiving contract. Funding is
/// not reachable from here:
///
/// ```compile_fail
/// use asset_ledger::{AccountId, ReentrantLedger};
///
/// fn mint(ledger: &mut ReentrantLedger<'_>, owner: &AccountId) {
///     let _ = ledger.fund(owner, owner, 1_000_000);
/// }
/// ```
pub struct ReentrantLedger<'a> {
    ledger: &'a mut Ledger,
    context: &'a dyn ExecutionContext,
    caller: AccountId,
}

impl<'a> ReentrantLedger<'a> {
    fn new(ledger: &'a mut Ledger, context: &'a dyn ExecutionContext, caller: AccountId) -> Self {
        Self {
            ledger,
            context,
            caller,
        }
    }

    /// The contract whose hook is running
    pub fn caller(&self) -> &AccountId {
        &self.caller
    }

    /// Minting authority
    pub fn owner(&self) -> &AccountId {
        self.ledger.owner()
    }

    /// Total units in existence
    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    /// Balance of `account`
    pub fn balance_of(&self, account: &AccountId) -> Amount {
        self.ledger.balance_of(account)
    }

    /// `Transfer` records with `from <= sequence <= to`
    pub fn events(&self, from: u64, to: Option<u64>) -> Vec<EventRecord> {
        self.ledger.events(from, to)
    }

    /// Number of `Transfer` records so far, including the one being acknowledged
    pub fn events_recorded(&self) -> u64 {
        self.ledger.sink().len()
    }

    /// Transfer from the receiving contract to `recipient`
    pub fn transfer(&mut self, recipient: &AccountId, amount: Amount) -> Result<TransferReceipt> {
        self.transfer_with_data(recipient, amount, None)
    }

    /// Transfer from the receiving contract to `recipient` with hook data
    pub fn transfer_with_data(
        &mut self,
        recipient: &AccountId,
        amount: Amount,
        data: Option<&[u8]>,
    ) -> Result<TransferReceipt> {
        self.ledger
            .transfer_with_data(self.context, &self.caller, recipient, amount, data)
    }
}

impl fmt::Debug for ReentrantLedger<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReentrantLedger")
            .field("caller", &self.caller)
            .field("depth", &self.ledger.hook_depth)
            .finish()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("info", &self.info)
            .field("total_supply", &self.total_supply)
            .field("holders", &self.balances.len())
            .field("events", &self.sink.len())
            .finish()
    }
}

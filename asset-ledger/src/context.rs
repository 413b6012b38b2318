//! Execution context: recipient classification and the receiver hook
//!
//! The ledger never inspects a recipient itself. It asks the
//! [`ExecutionContext`] for a [`Recipient`] tag and branches on it:
//!
//! - [`Recipient::Account`]: plain account, no notification
//! - [`Recipient::Receiver`]: contract exposing [`TokenReceiver`], notified after commit
//! - [`Recipient::Contract`]: contract without the hook, transfer is rejected

use crate::{
    ledger::ReentrantLedger,
    types::{AccountId, Amount},
    Result,
};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

/// Acknowledgment entry point of a contract recipient
pub trait TokenReceiver: Send + Sync {
    /// Called once per incoming transfer, after balances are updated and the
    /// `Transfer` event is recorded.
    ///
    /// `ledger` acts on behalf of the receiving contract; re-entrant transfers
    /// go through it and observe the post-transfer state. `data` is `None`
    /// when the sender attached nothing, which is distinct from `Some(&[])`.
    fn on_token_received(
        &self,
        ledger: &mut ReentrantLedger<'_>,
        from: &AccountId,
        value: Amount,
        data: Option<&[u8]>,
    ) -> Result<()>;
}

/// Capability classification of a transfer recipient
#[derive(Clone)]
pub enum Recipient {
    /// Plain account
    Account,
    /// Contract implementing the acknowledgment hook
    Receiver(Arc<dyn TokenReceiver>),
    /// Contract lacking the acknowledgment hook
    Contract,
}

impl Recipient {
    /// Metrics/log label
    pub fn label(&self) -> &'static str {
        match self {
            Recipient::Account => "account",
            Recipient::Receiver(_) => "receiver",
            Recipient::Contract => "contract",
        }
    }
}

impl fmt::Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host environment the ledger is invoked through
pub trait ExecutionContext: Send + Sync {
    /// Classify `account` as a transfer recipient
    fn classify(&self, account: &AccountId) -> Recipient;
}

#[derive(Clone)]
enum Deployment {
    Receiver(Arc<dyn TokenReceiver>),
    Opaque,
}

/// Context backed by an in-memory contract registry.
///
/// Every identity that was never registered is a plain account.
#[derive(Default)]
pub struct InMemoryContext {
    contracts: DashMap<AccountId, Deployment>,
}

impl InMemoryContext {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract that accepts transfers through `receiver`
    pub fn register_receiver(&self, account: AccountId, receiver: Arc<dyn TokenReceiver>) {
        tracing::debug!(%account, "Receiver contract registered");
        self.contracts.insert(account, Deployment::Receiver(receiver));
    }

    /// Register a contract without the acknowledgment hook
    pub fn register_contract(&self, account: AccountId) {
        tracing::debug!(%account, "Contract registered");
        self.contracts.insert(account, Deployment::Opaque);
    }

    /// Forget a registration; the identity becomes a plain account again
    pub fn unregister(&self, account: &AccountId) -> bool {
        self.contracts.remove(account).is_some()
    }

    /// Number of registered contracts
    pub fn contract_count(&self) -> usize {
        self.contracts.len()
    }
}

impl ExecutionContext for InMemoryContext {
    fn classify(&self, account: &AccountId) -> Recipient {
        match self.contracts.get(account).map(|entry| entry.value().clone()) {
            Some(Deployment::Receiver(receiver)) => Recipient::Receiver(receiver),
            Some(Deployment::Opaque) => Recipient::Contract,
            None => Recipient::Account,
        }
    }
}

impl fmt::Debug for InMemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryContext")
            .field("contracts", &self.contracts.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopReceiver;

    impl TokenReceiver for NoopReceiver {
        fn on_token_received(
            &self,
            _ledger: &mut ReentrantLedger<'_>,
            _from: &AccountId,
            _value: Amount,
            _data: Option<&[u8]>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unregistered_identity_is_account() {
        let context = InMemoryContext::new();
        assert!(matches!(
            context.classify(&AccountId::new("alice")),
            Recipient::Account
        ));
    }

    #[test]
    fn test_classification_follows_registry() {
        let context = InMemoryContext::new();
        let receiver = AccountId::new("receiver");
        let opaque = AccountId::new("opaque");

        context.register_receiver(receiver.clone(), Arc::new(NoopReceiver));
        context.register_contract(opaque.clone());

        assert_eq!(context.contract_count(), 2);
        assert_eq!(context.classify(&receiver).label(), "receiver");
        assert_eq!(context.classify(&opaque).label(), "contract");

        assert!(context.unregister(&opaque));
        assert_eq!(context.classify(&opaque).label(), "account");
    }
}

//! Actor-based serialization of ledger invocations
//!
//! One Tokio task owns the [`Ledger`]. Callers hold a cloneable
//! [`LedgerHandle`] and send messages over a bounded mailbox, so concurrent
//! callers are ordered into a single sequence and every invocation (including
//! its receiver hook) runs to completion before the next one starts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   Ledger::fund / Ledger::transfer_with_data           │
//! │                       │                               │
//! │                       ▼                               │
//! │      TokenReceiver::on_token_received (sync)          │
//! │      re-enters through ReentrantLedger, not the handle│
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    context::ExecutionContext,
    events::EventRecord,
    types::{AccountId, Amount, FundReceipt, TokenInfo, TransferReceipt},
    Error, Ledger, Result,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Mint units into an account
    Fund {
        /// Invoking identity
        caller: AccountId,
        /// Account to credit
        target: AccountId,
        /// Units to mint
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<FundReceipt>>,
    },

    /// Transfer units, with optional data for the receiver hook
    Transfer {
        /// Sending identity
        caller: AccountId,
        /// Receiving identity
        recipient: AccountId,
        /// Units to move
        amount: Amount,
        /// Payload for the receiver hook
        data: Option<Vec<u8>>,
        /// Reply channel
        response: oneshot::Sender<Result<TransferReceipt>>,
    },

    /// Get an account balance
    BalanceOf {
        /// Account to look up
        account: AccountId,
        /// Reply channel
        response: oneshot::Sender<Amount>,
    },

    /// Get total supply
    TotalSupply {
        /// Reply channel
        response: oneshot::Sender<Amount>,
    },

    /// Get symbol, name and owner
    TokenInfo {
        /// Reply channel
        response: oneshot::Sender<TokenInfo>,
    },

    /// Get `Transfer` records in a sequence range
    Events {
        /// First sequence, inclusive
        from: u64,
        /// Last sequence, inclusive; `None` means latest
        to: Option<u64>,
        /// Reply channel
        response: oneshot::Sender<Vec<EventRecord>>,
    },

    /// Stop the actor and hand the ledger back
    Shutdown {
        /// Receives the ledger once the actor has stopped
        response: oneshot::Sender<Ledger>,
    },
}

/// Actor that processes ledger messages
struct LedgerActor {
    /// The ledger (sole owner)
    ledger: Ledger,

    /// Recipient classification
    context: Arc<dyn ExecutionContext>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Run the actor event loop
    async fn run(mut self) {
        let mut shutdown = None;

        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Shutdown { response } => {
                    shutdown = Some(response);
                    break;
                }
                msg => self.handle_message(msg),
            }
        }

        tracing::info!(
            total_supply = self.ledger.total_supply(),
            events = self.ledger.sink().len(),
            "Ledger actor stopped"
        );

        if let Some(response) = shutdown {
            let _ = response.send(self.ledger);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::Fund {
                caller,
                target,
                amount,
                response,
            } => {
                let result = self.ledger.fund(&caller, &target, amount);
                if response.send(result).is_err() {
                    tracing::warn!(%caller, %target, "Caller went away before fund reply");
                }
            }

            LedgerMessage::Transfer {
                caller,
                recipient,
                amount,
                data,
                response,
            } => {
                let result = self.ledger.transfer_with_data(
                    self.context.as_ref(),
                    &caller,
                    &recipient,
                    amount,
                    data.as_deref(),
                );
                if response.send(result).is_err() {
                    tracing::warn!(%caller, %recipient, "Caller went away before transfer reply");
                }
            }

            LedgerMessage::BalanceOf { account, response } => {
                let _ = response.send(self.ledger.balance_of(&account));
            }

            LedgerMessage::TotalSupply { response } => {
                let _ = response.send(self.ledger.total_supply());
            }

            LedgerMessage::TokenInfo { response } => {
                let _ = response.send(self.ledger.token_info().clone());
            }

            LedgerMessage::Events { from, to, response } => {
                let _ = response.send(self.ledger.events(from, to));
            }

            LedgerMessage::Shutdown { .. } => {
                // Handled in main loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(message(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Mint units into `target` on behalf of `caller`
    pub async fn fund(
        &self,
        caller: AccountId,
        target: AccountId,
        amount: Amount,
    ) -> Result<FundReceipt> {
        self.request(|response| LedgerMessage::Fund {
            caller,
            target,
            amount,
            response,
        })
        .await?
    }

    /// Transfer without attached data
    pub async fn transfer(
        &self,
        caller: AccountId,
        recipient: AccountId,
        amount: Amount,
    ) -> Result<TransferReceipt> {
        self.transfer_with_data(caller, recipient, amount, None).await
    }

    /// Transfer with optional data for the receiver hook
    pub async fn transfer_with_data(
        &self,
        caller: AccountId,
        recipient: AccountId,
        amount: Amount,
        data: Option<Vec<u8>>,
    ) -> Result<TransferReceipt> {
        self.request(|response| LedgerMessage::Transfer {
            caller,
            recipient,
            amount,
            data,
            response,
        })
        .await?
    }

    /// Get balance of `account`
    pub async fn balance_of(&self, account: AccountId) -> Result<Amount> {
        self.request(|response| LedgerMessage::BalanceOf { account, response })
            .await
    }

    /// Get total supply
    pub async fn total_supply(&self) -> Result<Amount> {
        self.request(|response| LedgerMessage::TotalSupply { response })
            .await
    }

    /// Get symbol, name and owner
    pub async fn token_info(&self) -> Result<TokenInfo> {
        self.request(|response| LedgerMessage::TokenInfo { response })
            .await
    }

    /// Get `Transfer` records with `from <= sequence <= to`
    pub async fn events(&self, from: u64, to: Option<u64>) -> Result<Vec<EventRecord>> {
        self.request(|response| LedgerMessage::Events { from, to, response })
            .await
    }

    /// Stop the actor and take the ledger back
    pub async fn shutdown(&self) -> Result<Ledger> {
        self.request(|response| LedgerMessage::Shutdown { response })
            .await
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(
    ledger: Ledger,
    context: Arc<dyn ExecutionContext>,
    mailbox_capacity: usize,
) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor {
        ledger,
        context,
        mailbox: rx,
    };

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}

//! Asset Ledger
//!
//! Single-owner fungible asset ledger with acknowledged transfers.
//!
//! # Architecture
//!
//! - **Owner-minted supply**: only the owner funds accounts; the owner never
//!   sends or receives transfers
//! - **Atomic transfers**: a rejected transfer leaves balances and the event log untouched
//! - **Receiver hook**: contract recipients are notified after the transfer is recorded
//! - **Single writer**: one actor task serializes all invocations

#![forbid(unsafe_code)]
//!
//! # Invariants
//!
//! - Money conservation: total supply == Σ(balances) after every call
//! - Owner balance only grows through `fund`
//! - Append-only: `Transfer` records are never modified or deleted once an
//!   invocation commits

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod types;
pub mod events;
pub mod context;
pub mod ledger;
pub mod error;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    AccountId, Acknowledgment, Amount, FundReceipt, TokenInfo, TransferEvent, TransferReceipt,
};
pub use context::{ExecutionContext, InMemoryContext, Recipient, TokenReceiver};
pub use events::{EventRecord, EventSink, MemoryEventSink};
pub use actor::{spawn_ledger_actor, LedgerHandle};
pub use ledger::{Ledger, ReentrantLedger, MAX_HOOK_DEPTH};
pub use config::Config;
pub use metrics::Metrics;

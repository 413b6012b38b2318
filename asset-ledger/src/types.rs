//! Core types for the ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Exact arithmetic (unsigned integer token units)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token amount in indivisible units
pub type Amount = u128;

/// Account identifier (an opaque address)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(String);

impl AccountId {
    /// Create new account ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Name/symbol pair fixed at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Ticker symbol, e.g. `CLR`
    pub symbol: String,
    /// Human readable name
    pub name: String,
    /// Minting authority
    pub owner: AccountId,
}

/// Record of a successful transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEvent {
    /// Sender
    pub from: AccountId,
    /// Recipient
    pub to: AccountId,
    /// Units moved
    pub value: Amount,
}

/// Outcome of the recipient notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acknowledgment {
    /// Recipient is a plain account, nothing to notify
    NotRequired,
    /// Receiver hook ran and returned success
    Accepted,
    /// Receiver hook ran and returned an error; the transfer stands
    Failed(String),
}

/// Result of a committed fund call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FundReceipt {
    /// Funded account
    pub target: AccountId,
    /// Units minted
    pub amount: Amount,
    /// Target balance after minting
    pub balance: Amount,
    /// Total supply after minting
    pub total_supply: Amount,
}

/// Result of a committed transfer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Sequence number of the appended `Transfer` record
    pub sequence: u64,
    /// The appended event
    pub event: TransferEvent,
    /// What happened when the recipient was notified
    pub acknowledgment: Acknowledgment,
}

//! Error types for the asset ledger

use crate::types::Amount;
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// The first six variants are business-rule rejections: the invocation was
/// refused and no state changed. The remaining variants are infrastructure
/// failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller is not the owner for an owner-only operation
    #[error("Unauthorized: only the owner can perform this operation")]
    Unauthorized,

    /// Owner attempted to send a transfer
    #[error("The owner can not send transfers")]
    OwnerCannotTransfer,

    /// Owner attempted to receive a transfer
    #[error("The owner can not receive transfers")]
    OwnerCannotReceive,

    /// Sender balance is below the requested amount
    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance {
        /// Requested transfer amount
        required: Amount,
        /// Sender balance at the time of the request
        available: Amount,
    },

    /// Recipient is a contract without the acknowledgment capability
    #[error("Recipient rejected: {0} does not accept token transfers")]
    RecipientRejected(String),

    /// A receiver hook nested transfers to hook-bearing recipients too deeply
    #[error("Re-entrancy limit reached: receiver hooks nested {0} deep")]
    ReentrancyLimit(usize),

    /// Minting would exceed the representable supply
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Raised by a token receiver while handling an acknowledgment
    #[error("Acknowledgment failed: {0}")]
    Acknowledgment(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for business-rule rejections, false for infrastructure failures.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized
                | Error::OwnerCannotTransfer
                | Error::OwnerCannotReceive
                | Error::InsufficientBalance { .. }
                | Error::RecipientRejected(_)
                | Error::ReentrancyLimit(_)
        )
    }

    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Unauthorized => "unauthorized",
            Error::OwnerCannotTransfer => "owner_cannot_transfer",
            Error::OwnerCannotReceive => "owner_cannot_receive",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::RecipientRejected(_) => "recipient_rejected",
            Error::ReentrancyLimit(_) => "reentrancy_limit",
            Error::Overflow(_) => "overflow",
            Error::Acknowledgment(_) => "acknowledgment",
            Error::Concurrency(_) => "concurrency",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Metrics(_) => "metrics",
            Error::Io(_) => "io",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_classification() {
        assert!(Error::Unauthorized.is_rejection());
        assert!(Error::RecipientRejected("0xabc".to_string()).is_rejection());
        assert!(Error::InsufficientBalance {
            required: 150,
            available: 100
        }
        .is_rejection());
        assert!(Error::ReentrancyLimit(8).is_rejection());
        assert!(!Error::Overflow("supply".to_string()).is_rejection());
        assert!(!Error::Concurrency("closed".to_string()).is_rejection());
    }

    #[test]
    fn test_insufficient_balance_message() {
        let err = Error::InsufficientBalance {
            required: 150,
            available: 100,
        };
        assert_eq!(err.kind(), "insufficient_balance");
        assert!(err.to_string().contains("required 150"));
        assert!(err.to_string().contains("available 100"));
    }
}

//! Event sink for `Transfer` records
//!
//! The ledger appends exactly one record per committed transfer. Records are
//! hash-chained: each record's hash covers the previous record's hash, so any
//! rewrite of history breaks [`MemoryEventSink::verify_chain`].
//!
//! # Layout
//!
//! ```text
//! seq 0 (genesis)     seq 1                seq 2
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ prev = 0x00… │ ◄──│ prev = h0    │ ◄──│ prev = h1    │
//! │ hash = h0    │    │ hash = h1    │    │ hash = h2    │
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```

use crate::{types::TransferEvent, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Hash of the record preceding the genesis record
pub const GENESIS_HASH: [u8; 32] = [0u8; 32];

/// A `Transfer` event as stored in the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0
    pub sequence: u64,

    /// Unique record ID (UUIDv7 for time-ordering)
    pub event_id: Uuid,

    /// Append timestamp
    pub recorded_at: DateTime<Utc>,

    /// The transfer itself
    pub event: TransferEvent,

    /// Hash of the previous record
    pub previous_hash: [u8; 32],

    /// Hash of this record
    pub hash: [u8; 32],
}

impl EventRecord {
    /// Compute record hash
    pub fn compute_hash(&self) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.previous_hash);
        hasher.update(self.sequence.to_be_bytes());
        hasher.update(self.event_id.as_bytes());
        hasher.update(
            self.recorded_at
                .timestamp_nanos_opt()
                .unwrap_or(0)
                .to_be_bytes(),
        );
        hasher.update(bincode::serialize(&self.event)?);

        Ok(hasher.finalize().into())
    }
}

/// Append-only destination for `Transfer` records
pub trait EventSink: Send {
    /// Append a record, returning its sequence number
    fn append(&mut self, event: TransferEvent) -> Result<u64>;

    /// Number of records appended so far
    fn len(&self) -> u64;

    /// True when nothing has been appended
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every record at or after `len`.
    ///
    /// Only the ledger calls this, and only to abort the invocation that
    /// appended those records.
    fn truncate(&mut self, len: u64);

    /// Records with `from <= sequence <= to`; `to = None` means latest
    fn range(&self, from: u64, to: Option<u64>) -> Vec<EventRecord>;
}

/// In-memory hash-chained event log
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    records: Vec<EventRecord>,
}

impl MemoryEventSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent record
    pub fn latest(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// Check sequence contiguity and the hash chain from genesis
    pub fn verify_chain(&self) -> Result<bool> {
        let mut previous_hash = GENESIS_HASH;

        for (index, record) in self.records.iter().enumerate() {
            if record.sequence != index as u64 || record.previous_hash != previous_hash {
                return Ok(false);
            }
            if record.compute_hash()? != record.hash {
                return Ok(false);
            }
            previous_hash = record.hash;
        }

        Ok(true)
    }
}

impl EventSink for MemoryEventSink {
    fn append(&mut self, event: TransferEvent) -> Result<u64> {
        let sequence = self.records.len() as u64;
        let previous_hash = self.latest().map_or(GENESIS_HASH, |r| r.hash);

        let mut record = EventRecord {
            sequence,
            event_id: Uuid::now_v7(),
            recorded_at: Utc::now(),
            event,
            previous_hash,
            hash: [0u8; 32], // Computed below
        };
        record.hash = record.compute_hash()?;

        tracing::debug!(
            sequence,
            event_id = %record.event_id,
            hash = %hex::encode(record.hash),
            "Transfer event appended"
        );

        self.records.push(record);
        Ok(sequence)
    }

    fn len(&self) -> u64 {
        self.records.len() as u64
    }

    fn truncate(&mut self, len: u64) {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if len < self.records.len() {
            tracing::debug!(
                dropped = self.records.len() - len,
                "Transfer events discarded"
            );
            self.records.truncate(len);
        }
    }

    fn range(&self, from: u64, to: Option<u64>) -> Vec<EventRecord> {
        self.records
            .iter()
            .filter(|r| r.sequence >= from && to.map_or(true, |to| r.sequence <= to))
            .cloned()
            .collect()
    }
}

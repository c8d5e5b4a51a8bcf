//! Ledger and availability-key stores
//!
//! The ledger holds one entry per granule keyed by `granule_id`. The tile
//! index holds availability keys for granules whose ingest succeeded.

use std::collections::HashMap;

use async_trait::async_trait;
use swodlr_common::{AvailabilityKey, JobStatus, LedgerEntry, StatusUpdate};
use thiserror::Error;

pub mod dynamodb;
pub mod memory;

pub use dynamodb::{DynamoDbLedger, DynamoDbTileIndex};
pub use memory::MemoryLedger;

/// Faults from either store
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("DynamoDB {operation} failed: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    #[error("Malformed ledger item: {0}")]
    MalformedItem(String),

    #[error("Keys still unprocessed after {0} attempts")]
    Unprocessed(usize),

    #[error("Ledger lock poisoned")]
    Poisoned,
}

/// Per-granule ingest status record
#[async_trait]
pub trait IngestLedger: Send + Sync {
    /// Current status of every id in `granule_ids` that has an entry.
    /// Ids without an entry are absent from the map.
    async fn statuses(&self, granule_ids: &[String]) -> Result<HashMap<String, JobStatus>, LedgerError>;

    /// Create or overwrite the entry for `entry.granule_id`
    async fn record_submission(&self, entry: &LedgerEntry) -> Result<(), LedgerError>;

    /// Set status, last check time and, when present, traceback
    async fn update_status(&self, update: &StatusUpdate) -> Result<(), LedgerError>;
}

/// Set of availability keys
#[async_trait]
pub trait TileIndex: Send + Sync {
    /// Insert `key`. Returns `false` if it was already present, which is not
    /// an error.
    async fn insert(&self, key: &AvailabilityKey) -> Result<bool, LedgerError>;
}

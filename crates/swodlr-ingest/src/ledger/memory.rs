//! In-process ledger for local runs and tests

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use swodlr_common::{AvailabilityKey, JobStatus, LedgerEntry, StatusUpdate};

use super::{IngestLedger, LedgerError, TileIndex};

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, LedgerEntry>,
    tiles: BTreeSet<String>,
}

/// Ledger and tile index held in memory.
///
/// `update_status` on an unknown id creates a bare entry, the same upsert
/// behavior as DynamoDB `UpdateItem`.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: Mutex<State>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, LedgerError> {
        self.state.lock().map_err(|_| LedgerError::Poisoned)
    }

    /// Seed an entry, replacing any existing one
    pub fn insert_entry(&self, entry: LedgerEntry) -> Result<(), LedgerError> {
        self.lock()?.entries.insert(entry.granule_id.clone(), entry);
        Ok(())
    }

    pub fn entry(&self, granule_id: &str) -> Option<LedgerEntry> {
        self.lock().ok()?.entries.get(granule_id).cloned()
    }

    /// All entries sorted by granule id
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let mut entries: Vec<_> = match self.lock() {
            Ok(state) => state.entries.values().cloned().collect(),
            Err(_) => Vec::new(),
        };
        entries.sort_by(|a, b| a.granule_id.cmp(&b.granule_id));
        entries
    }

    /// Recorded availability keys in order
    pub fn tiles(&self) -> Vec<String> {
        match self.lock() {
            Ok(state) => state.tiles.iter().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl IngestLedger for MemoryLedger {
    async fn statuses(&self, granule_ids: &[String]) -> Result<HashMap<String, JobStatus>, LedgerError> {
        let state = self.lock()?;
        Ok(granule_ids
            .iter()
            .filter_map(|id| state.entries.get(id).map(|entry| (id.clone(), entry.status.clone())))
            .collect())
    }

    async fn record_submission(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        self.insert_entry(entry.clone())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), LedgerError> {
        let mut state = self.lock()?;
        let entry = state
            .entries
            .entry(update.granule_id.clone())
            .or_insert_with(|| LedgerEntry {
                granule_id: update.granule_id.clone(),
                s3_url: String::new(),
                job_id: String::new(),
                status: update.status.clone(),
                last_check: update.last_check,
                traceback: None,
            });

        entry.status = update.status.clone();
        entry.last_check = update.last_check;
        if let Some(traceback) = &update.traceback {
            entry.traceback = Some(traceback.clone());
        }
        Ok(())
    }
}

#[async_trait]
impl TileIndex for MemoryLedger {
    async fn insert(&self, key: &AvailabilityKey) -> Result<bool, LedgerError> {
        Ok(self.lock()?.tiles.insert(key.key()))
    }
}

//! Polling stage
//!
//! Checks each outstanding job, writes the result into the ledger and
//! records the tile of every successful granule. Only non-terminal jobs are
//! handed back for the next poll.

use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use swodlr_common::{AvailabilityKey, JobBatch, JobReceipt, StatusClass, StatusUpdate};
use tracing::{debug, error, info, instrument, warn};

use crate::config::DEFAULT_MAX_CONCURRENCY;
use crate::error::{IngestError, IngestResult};
use crate::ledger::{IngestLedger, TileIndex};
use crate::sds::JobSubmitter;

/// What happened to one receipt during a poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    /// Job still running; retained
    Pending,
    /// Job completed; removed
    Succeeded,
    /// Job failed; removed
    Failed,
    /// Status could not be applied; retained unchanged
    Faulted,
}

impl PollOutcome {
    pub fn retains(self) -> bool {
        matches!(self, PollOutcome::Pending | PollOutcome::Faulted)
    }
}

/// Per-receipt results of one poll, in input order
#[derive(Debug, Clone, Default)]
pub struct PollReport {
    pub outcomes: Vec<(JobReceipt, PollOutcome)>,
}

impl PollReport {
    /// Receipts to poll again
    pub fn remaining(&self) -> JobBatch {
        JobBatch::new(
            self.outcomes
                .iter()
                .filter(|(_, outcome)| outcome.retains())
                .map(|(receipt, _)| receipt.clone())
                .collect(),
        )
    }

    pub fn count(&self, outcome: PollOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }
}

pub struct StatusReconciler {
    ledger: Arc<dyn IngestLedger>,
    tiles: Arc<dyn TileIndex>,
    submitter: Arc<dyn JobSubmitter>,
    max_concurrency: usize,
}

impl StatusReconciler {
    pub fn new(
        ledger: Arc<dyn IngestLedger>,
        tiles: Arc<dyn TileIndex>,
        submitter: Arc<dyn JobSubmitter>,
    ) -> Self {
        Self {
            ledger,
            tiles,
            submitter,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Poll every receipt and return the ones still outstanding
    pub async fn poll(&self, batch: &JobBatch) -> JobBatch {
        self.reconcile(batch).await.remaining()
    }

    #[instrument(skip_all, fields(jobs = batch.len()))]
    pub async fn reconcile(&self, batch: &JobBatch) -> PollReport {
        let outcomes: Vec<PollOutcome> = stream::iter(batch.jobs.iter())
            .map(|receipt| self.reconcile_receipt(receipt))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let report = PollReport {
            outcomes: batch.jobs.iter().cloned().zip(outcomes).collect(),
        };

        info!(
            succeeded = report.count(PollOutcome::Succeeded),
            failed = report.count(PollOutcome::Failed),
            pending = report.count(PollOutcome::Pending),
            faulted = report.count(PollOutcome::Faulted),
            "Poll complete"
        );
        report
    }

    async fn reconcile_receipt(&self, receipt: &JobReceipt) -> PollOutcome {
        match self.apply_status(receipt).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    granule_id = %receipt.granule_id,
                    job_id = %receipt.job_id,
                    error = %err,
                    "Failed to reconcile job"
                );
                PollOutcome::Faulted
            },
        }
    }

    async fn apply_status(&self, receipt: &JobReceipt) -> IngestResult<PollOutcome> {
        let report = self
            .submitter
            .job_status(&receipt.job_id)
            .await
            .map_err(|source| IngestError::StatusQueryFault {
                job_id: receipt.job_id.clone(),
                source,
            })?;

        debug!(job_id = %receipt.job_id, status = %report.status, "Job status");

        self.ledger
            .update_status(&StatusUpdate {
                granule_id: receipt.granule_id.clone(),
                status: report.status.clone(),
                last_check: Utc::now(),
                traceback: report.traceback.clone(),
            })
            .await?;

        match report.status.class() {
            StatusClass::Succeeded => {
                info!(granule_id = %receipt.granule_id, job_id = %receipt.job_id, "Job completed");
                self.record_availability(&receipt.granule_id).await?;
                Ok(PollOutcome::Succeeded)
            },
            StatusClass::Failed => {
                error!(
                    granule_id = %receipt.granule_id,
                    job_id = %receipt.job_id,
                    status = %report.status,
                    traceback = report.traceback.as_deref().unwrap_or(""),
                    "Job failed"
                );
                Ok(PollOutcome::Failed)
            },
            StatusClass::Pending => {
                if !report.status.is_known() {
                    warn!(job_id = %receipt.job_id, status = %report.status, "Unrecognized job status");
                }
                Ok(PollOutcome::Pending)
            },
        }
    }

    async fn record_availability(&self, granule_id: &str) -> IngestResult<()> {
        match AvailabilityKey::from_granule_id(granule_id) {
            Some(key) => {
                if self.tiles.insert(&key).await? {
                    info!(granule_id, tile_id = %key, "Recorded tile availability");
                }
            },
            None => warn!(granule_id, "Granule id does not name a tile; no availability recorded"),
        }
        Ok(())
    }
}

//! Submission stage
//!
//! Turns a queue batch into SDS ingest jobs. Granules whose ledger entry
//! already reports success are skipped, so re-delivered notifications do not
//! trigger a second ingest.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use swodlr_common::notification::{parse_notification, ParserConfig};
use swodlr_common::{Granule, JobBatch, JobReceipt, LedgerEntry};
use tracing::{debug, error, info, instrument, warn};

use crate::config::DEFAULT_MAX_CONCURRENCY;
use crate::error::{IngestError, IngestResult};
use crate::events::QueueRecord;
use crate::ledger::IngestLedger;
use crate::sds::{IngestJob, JobSpec, JobSubmitter};

pub struct SubmissionCoordinator {
    parser: ParserConfig,
    ledger: Arc<dyn IngestLedger>,
    submitter: Arc<dyn JobSubmitter>,
    job_spec: JobSpec,
    max_concurrency: usize,
}

impl SubmissionCoordinator {
    pub fn new(
        parser: ParserConfig,
        ledger: Arc<dyn IngestLedger>,
        submitter: Arc<dyn JobSubmitter>,
        job_spec: JobSpec,
    ) -> Self {
        Self {
            parser,
            ledger,
            submitter,
            job_spec,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency.max(1);
        self
    }

    /// Submit every new granule in `records`.
    ///
    /// Returns receipts for the jobs created by this call only. Bad records
    /// and failed submissions are logged and left out.
    #[instrument(skip_all, fields(records = records.len()))]
    pub async fn submit_records(&self, records: &[QueueRecord]) -> JobBatch {
        let candidates = self.collect_granules(records);
        if candidates.is_empty() {
            debug!("No granules to submit");
            return JobBatch::default();
        }

        let pending = match self.filter_ingested(candidates).await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "Ledger lookup failed; submitting nothing");
                return JobBatch::default();
            },
        };

        let results: Vec<_> = stream::iter(pending.iter())
            .map(|granule| self.submit_granule(granule))
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let mut jobs = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(receipt) => jobs.push(receipt),
                Err(err) => error!(error = %err, "Failed to ingest granule"),
            }
        }

        info!(submitted = jobs.len(), "Submission complete");
        JobBatch::new(jobs)
    }

    /// Parse each record and deduplicate by granule id.
    ///
    /// Order follows the first occurrence of each id; a later duplicate
    /// replaces the earlier value.
    pub fn collect_granules(&self, records: &[QueueRecord]) -> Vec<Granule> {
        let mut granules: Vec<Granule> = Vec::with_capacity(records.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for record in records {
            let granule = match parse_notification(&record.body, &self.parser) {
                Ok(granule) => granule,
                Err(err) if err.is_record_error() => {
                    warn!(message_id = %record.message_id, error = %err, "Skipping unusable notification");
                    continue;
                },
                Err(err) => {
                    error!(message_id = %record.message_id, error = %err, "Failed to parse notification");
                    continue;
                },
            };

            match positions.get(&granule.id) {
                Some(&index) => {
                    debug!(granule_id = %granule.id, "Duplicate granule in batch");
                    granules[index] = granule;
                },
                None => {
                    positions.insert(granule.id.clone(), granules.len());
                    granules.push(granule);
                },
            }
        }

        granules
    }

    async fn filter_ingested(&self, candidates: Vec<Granule>) -> IngestResult<Vec<Granule>> {
        let ids: Vec<String> = candidates.iter().map(|g| g.id.clone()).collect();
        let statuses = self.ledger.statuses(&ids).await?;

        Ok(candidates
            .into_iter()
            .filter(|granule| match statuses.get(&granule.id) {
                Some(status) if status.is_success() => {
                    info!(granule_id = %granule.id, "Granule already ingested");
                    false
                },
                _ => true,
            })
            .collect())
    }

    async fn submit_granule(&self, granule: &Granule) -> IngestResult<JobReceipt> {
        let job = IngestJob::for_granule(&self.job_spec, granule);
        let submitted = self
            .submitter
            .submit(&job)
            .await
            .map_err(|source| IngestError::SubmissionFault {
                granule_id: granule.id.clone(),
                source,
            })?;

        info!(granule_id = %granule.id, job_id = %submitted.job_id, "Submitted to SDS");

        let entry = LedgerEntry::queued(granule, &submitted.job_id, Utc::now());
        if let Err(err) = self.ledger.record_submission(&entry).await {
            // the SDS job exists and still has to be polled
            error!(
                granule_id = %granule.id,
                job_id = %submitted.job_id,
                error = %err,
                "Failed to record submission in ledger"
            );
        }

        Ok(JobReceipt::new(granule.id.clone(), submitted.job_id))
    }
}

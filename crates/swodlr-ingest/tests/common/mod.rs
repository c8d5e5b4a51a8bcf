//! Shared fixtures for swodlr-ingest integration tests
//!
//! - [`FakeSds`]: scripted [`JobSubmitter`] recording every submitted job
//! - [`FlakyLedger`]: [`MemoryLedger`] wrapper with switchable faults and
//!   call counters
//! - notification and settings builders

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use swodlr_common::{AvailabilityKey, JobStatus, LedgerEntry, StatusUpdate};
use swodlr_ingest::config::{IngestSettings, SsmParameters};
use swodlr_ingest::events::QueueRecord;
use swodlr_ingest::ledger::{IngestLedger, LedgerError, MemoryLedger, TileIndex};
use swodlr_ingest::sds::{IngestJob, JobReport, JobSpec, JobSubmitter, SdsError, SubmittedJob};

pub const RELEASE_TAG: &str = "2.0.0";
pub const QUEUE: &str = "swodlr-ingest-queue";

pub fn job_spec() -> JobSpec {
    JobSpec::new(RELEASE_TAG, QUEUE)
}

/// CNM-R body with the given identifier and file list
pub fn cnm_body(identifier: Option<&str>, files: Value) -> String {
    let mut body = json!({ "product": { "files": files } });
    if let Some(identifier) = identifier {
        body["identifier"] = json!(identifier);
    }
    body.to_string()
}

/// Record for one NetCDF granule at `s3://bucket/test/<id>.nc`
pub fn nc_record(id: &str) -> QueueRecord {
    let mut record = QueueRecord::new(cnm_body(
        Some(id),
        json!([
            { "name": format!("{}.nc", id), "uri": format!("s3://bucket/test/{}.nc", id), "type": "data" },
            { "name": format!("{}.nc.md5", id), "uri": format!("s3://bucket/test/{}.nc.md5", id), "type": "metadata" }
        ]),
    ));
    record.message_id = format!("msg-{}", id);
    record
}

pub fn settings_with(extra: &[(&str, &str)]) -> IngestSettings {
    let mut values: HashMap<String, String> = [
        ("ingest_table_name", "swodlr-ingest"),
        ("available_tiles_table_name", "swodlr-available-tiles"),
        ("sds_host", "http://sds.test"),
        ("sds_username", "swodlr"),
        ("sds_password", "hunter2"),
        ("sds_pcm_release_tag", RELEASE_TAG),
        ("sds_ingest_queue", QUEUE),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in extra {
        values.insert(k.to_string(), v.to_string());
    }

    IngestSettings::load(&SsmParameters::from_map(values)).expect("test settings are valid")
}

/// In-process SDS double
#[derive(Default)]
pub struct FakeSds {
    next_id: AtomicUsize,
    submitted: Mutex<Vec<IngestJob>>,
    rejected_files: Mutex<HashSet<String>>,
    reports: Mutex<HashMap<String, JobReport>>,
    status_queries: AtomicUsize,
}

impl FakeSds {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Reject submissions whose data file is `filename`
    pub fn reject_file(&self, filename: &str) {
        self.rejected_files.lock().unwrap().insert(filename.to_string());
    }

    pub fn set_status(&self, job_id: &str, status: &str, traceback: Option<&str>) {
        self.reports.lock().unwrap().insert(
            job_id.to_string(),
            JobReport {
                status: JobStatus::from(status),
                traceback: traceback.map(str::to_string),
            },
        );
    }

    pub fn submitted(&self) -> Vec<IngestJob> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn status_queries(&self) -> usize {
        self.status_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobSubmitter for FakeSds {
    async fn submit(&self, job: &IngestJob) -> Result<SubmittedJob, SdsError> {
        if self.rejected_files.lock().unwrap().contains(&job.params.data_file) {
            return Err(SdsError::Rejected("queue is paused".to_string()));
        }

        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.submitted.lock().unwrap().push(job.clone());
        Ok(SubmittedJob {
            job_id: format!("job-id-{}", n),
        })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobReport, SdsError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        self.reports
            .lock()
            .unwrap()
            .get(job_id)
            .cloned()
            .ok_or_else(|| SdsError::MalformedResponse(format!("no such job {}", job_id)))
    }
}

/// [`MemoryLedger`] with switchable faults
#[derive(Default)]
pub struct FlakyLedger {
    pub inner: MemoryLedger,
    pub fail_lookup: AtomicBool,
    pub fail_record: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_tiles: AtomicBool,
    pub lookups: AtomicUsize,
    pub records: AtomicUsize,
    pub updates: AtomicUsize,
}

impl FlakyLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail(flag: &AtomicBool) {
        flag.store(true, Ordering::SeqCst);
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn fault(flag: &AtomicBool, operation: &'static str) -> Result<(), LedgerError> {
        if flag.load(Ordering::SeqCst) {
            return Err(LedgerError::Store {
                operation,
                message: "ProvisionedThroughputExceededException".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IngestLedger for FlakyLedger {
    async fn statuses(&self, granule_ids: &[String]) -> Result<HashMap<String, JobStatus>, LedgerError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        Self::fault(&self.fail_lookup, "BatchGetItem")?;
        self.inner.statuses(granule_ids).await
    }

    async fn record_submission(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        self.records.fetch_add(1, Ordering::SeqCst);
        Self::fault(&self.fail_record, "PutItem")?;
        self.inner.record_submission(entry).await
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), LedgerError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        Self::fault(&self.fail_update, "UpdateItem")?;
        self.inner.update_status(update).await
    }
}

#[async_trait]
impl TileIndex for FlakyLedger {
    async fn insert(&self, key: &AvailabilityKey) -> Result<bool, LedgerError> {
        Self::fault(&self.fail_tiles, "PutItem")?;
        self.inner.insert(key).await
    }
}

//! Common types used across SWODLR

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod status;

pub use status::{JobStatus, StatusClass};

/// A granule ready for submission to the SDS.
///
/// Produced by the notification parser and consumed once by the submission
/// coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Granule {
    /// Granule identifier, unique across the archive
    pub id: String,
    /// Name of the accepted data file
    pub filename: String,
    /// Canonical `s3://bucket/key` location of the data file
    pub url: String,
}

/// Pairing of a granule with the SDS job ingesting it
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobReceipt {
    pub granule_id: String,
    pub job_id: String,
}

impl JobReceipt {
    pub fn new(granule_id: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            granule_id: granule_id.into(),
            job_id: job_id.into(),
        }
    }
}

/// Outstanding jobs handed between the coordinator, the reconciler, and
/// whatever schedules them.
///
/// Serialized as `{"jobs": [{"granule_id": ..., "job_id": ...}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBatch {
    #[serde(default)]
    pub jobs: Vec<JobReceipt>,
}

impl JobBatch {
    pub fn new(jobs: Vec<JobReceipt>) -> Self {
        Self { jobs }
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }
}

/// Row of the ingest ledger, keyed by `granule_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub granule_id: String,
    pub s3_url: String,
    pub job_id: String,
    pub status: JobStatus,
    pub last_check: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl LedgerEntry {
    /// Entry written right after a granule is accepted by the SDS
    pub fn queued(granule: &Granule, job_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            granule_id: granule.id.clone(),
            s3_url: granule.url.clone(),
            job_id: job_id.into(),
            status: JobStatus::Queued,
            last_check: at,
            traceback: None,
        }
    }
}

/// In-place change applied to a ledger entry after each status poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub granule_id: String,
    pub status: JobStatus,
    pub last_check: DateTime<Utc>,
    /// Only set when the SDS reported one; an absent traceback leaves the
    /// stored value untouched.
    pub traceback: Option<String>,
}

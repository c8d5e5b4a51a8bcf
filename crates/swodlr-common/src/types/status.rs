//! SDS job status vocabulary

use serde::{Deserialize, Serialize};

/// Status of an SDS job as reported by Mozart.
///
/// The wire form is the Mozart string (`job-queued`, `job-completed`, ...).
/// Strings outside the known vocabulary are kept verbatim so they can be
/// written to the ledger unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Queued,
    Started,
    Completed,
    Failed,
    Offline,
    Deduped,
    Unrecognized(String),
}

/// Coarse classification used by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The job may still change state
    Pending,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Queued => "job-queued",
            JobStatus::Started => "job-started",
            JobStatus::Completed => "job-completed",
            JobStatus::Failed => "job-failed",
            JobStatus::Offline => "job-offline",
            JobStatus::Deduped => "job-deduped",
            JobStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn class(&self) -> StatusClass {
        match self {
            JobStatus::Completed => StatusClass::Succeeded,
            JobStatus::Failed | JobStatus::Offline | JobStatus::Deduped => StatusClass::Failed,
            JobStatus::Queued | JobStatus::Started | JobStatus::Unrecognized(_) => {
                StatusClass::Pending
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.class() == StatusClass::Succeeded
    }

    /// Whether the status is part of the Mozart vocabulary
    pub fn is_known(&self) -> bool {
        !matches!(self, JobStatus::Unrecognized(_))
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "job-queued" => JobStatus::Queued,
            "job-started" => JobStatus::Started,
            "job-completed" => JobStatus::Completed,
            "job-failed" => JobStatus::Failed,
            "job-offline" => JobStatus::Offline,
            "job-deduped" => JobStatus::Deduped,
            other => JobStatus::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match JobStatus::from(s.as_str()) {
            JobStatus::Unrecognized(_) => JobStatus::Unrecognized(s),
            known => known,
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

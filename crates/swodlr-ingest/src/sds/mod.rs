//! SDS job API
//!
//! The coordinator and reconciler only see the [`JobSubmitter`] trait.
//! [`MozartClient`] implements it against the Mozart REST API.

use async_trait::async_trait;
use swodlr_common::JobStatus;
use thiserror::Error;

pub mod client;
pub mod job;

pub use client::MozartClient;
pub use job::{IngestJob, IngestJobParams, JobSpec, ProductMetadata};

/// Faults talking to the SDS
#[derive(Error, Debug)]
pub enum SdsError {
    #[error("SDS request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("SDS rejected request: {0}")]
    Rejected(String),

    #[error("Malformed SDS response: {0}")]
    MalformedResponse(String),
}

/// Job accepted by the SDS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedJob {
    pub job_id: String,
}

/// Status snapshot of one SDS job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub status: JobStatus,
    pub traceback: Option<String>,
}

/// Submits ingest jobs and reports on them
#[async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, job: &IngestJob) -> Result<SubmittedJob, SdsError>;

    async fn job_status(&self, job_id: &str) -> Result<JobReport, SdsError>;
}

//! Mozart REST client
//!
//! Talks to `{host}/mozart/api/v0.1/` with HTTP basic auth. Every reply is a
//! JSON envelope `{success, message, result}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize};
use swodlr_common::JobStatus;
use tracing::{debug, info};

use super::{IngestJob, JobReport, JobSubmitter, SdsError, SubmittedJob};
use crate::config::SdsConfig;

// ============================================================================
// Client Constants
// ============================================================================

/// Path of the Mozart API below the SDS host.
pub const MOZART_API_PATH: &str = "mozart/api/v0.1";

/// Default timeout for SDS requests in seconds.
pub const DEFAULT_SDS_TIMEOUT_SECS: u64 = 60;

/// Priority of submitted ingest jobs.
pub const DEFAULT_JOB_PRIORITY: u8 = 0;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    message: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct JobInfo {
    status: Option<String>,
    #[serde(default)]
    traceback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueueList {
    #[serde(default)]
    queues: Vec<String>,
    #[serde(default)]
    recommended: Vec<String>,
}

/// [`JobSubmitter`] over the Mozart API
pub struct MozartClient {
    client: Client,
    base_url: String,
    username: String,
    password: Option<String>,
}

impl MozartClient {
    pub fn new(config: &SdsConfig) -> Result<Self, SdsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_SDS_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: format!("{}/{}", config.host.trim_end_matches('/'), MOZART_API_PATH),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// First recommended queue for `job_type`, else the first listed queue.
    pub async fn recommended_queue(&self, job_type: &str) -> Result<String, SdsError> {
        let response = self
            .client
            .get(self.url("queue/list"))
            .basic_auth(&self.username, self.password.as_deref())
            .query(&[("id", job_type)])
            .send()
            .await?;

        let queues: QueueList = read_result(response).await?;
        let queue = queues
            .recommended
            .into_iter()
            .next()
            .or_else(|| queues.queues.into_iter().next())
            .ok_or_else(|| SdsError::Rejected(format!("no queue available for {}", job_type)))?;

        info!(job_type, queue = %queue, "Resolved SDS job queue");
        Ok(queue)
    }
}

#[async_trait]
impl JobSubmitter for MozartClient {
    async fn submit(&self, job: &IngestJob) -> Result<SubmittedJob, SdsError> {
        let tags = serde_json::to_string(&[&job.tag])
            .map_err(|e| SdsError::MalformedResponse(e.to_string()))?;
        let params = serde_json::to_string(&job.params)
            .map_err(|e| SdsError::MalformedResponse(e.to_string()))?;
        let priority = DEFAULT_JOB_PRIORITY.to_string();

        let form = [
            ("type", job.job_type.as_str()),
            ("queue", job.queue.as_str()),
            ("priority", priority.as_str()),
            ("tags", tags.as_str()),
            ("name", job.tag.as_str()),
            ("params", params.as_str()),
            ("enable_dedup", "false"),
        ];

        debug!(job_type = %job.job_type, tag = %job.tag, "Submitting SDS job");

        let response = self
            .client
            .post(self.url("job/submit"))
            .basic_auth(&self.username, self.password.as_deref())
            .form(&form)
            .send()
            .await?;

        let job_id: String = read_result(response).await?;
        if job_id.is_empty() {
            return Err(SdsError::MalformedResponse("empty job id".to_string()));
        }

        Ok(SubmittedJob { job_id })
    }

    async fn job_status(&self, job_id: &str) -> Result<JobReport, SdsError> {
        let response = self
            .client
            .get(self.url("job/info"))
            .basic_auth(&self.username, self.password.as_deref())
            .query(&[("id", job_id)])
            .send()
            .await?;

        let info: JobInfo = read_result(response).await?;
        let status = info
            .status
            .ok_or_else(|| SdsError::MalformedResponse(format!("no status for job {}", job_id)))?;

        Ok(JobReport {
            status: JobStatus::from(status),
            traceback: info.traceback.filter(|t| !t.is_empty()),
        })
    }
}

/// Unwrap the `result` of a Mozart envelope.
///
/// Non-2xx replies and `success: false` are rejections; bodies that do not
/// decode are malformed.
async fn read_result<T: DeserializeOwned>(response: Response) -> Result<T, SdsError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<Envelope<serde_json::Value>>(&body)
            .ok()
            .and_then(|envelope| envelope.message)
            .unwrap_or(body);
        return Err(SdsError::Rejected(format!("HTTP {}: {}", status.as_u16(), message)));
    }

    let envelope: Envelope<T> =
        serde_json::from_str(&body).map_err(|e| SdsError::MalformedResponse(e.to_string()))?;

    if envelope.success == Some(false) {
        return Err(SdsError::Rejected(
            envelope.message.unwrap_or_else(|| "request was not successful".to_string()),
        ));
    }

    envelope
        .result
        .ok_or_else(|| SdsError::MalformedResponse("missing result".to_string()))
}

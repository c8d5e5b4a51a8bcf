//! Ingest job requests

use serde::{Deserialize, Serialize};
use swodlr_common::Granule;

/// Prefix of the staged-ingest job type; the PCM release tag follows the colon
pub const INGEST_JOB_TYPE_PREFIX: &str = "job-INGEST_STAGED";

/// Prefix of the tag attached to each ingest job
pub const INGEST_TAG_PREFIX: &str = "ingest_file_otello__";

/// Which SDS job type and queue ingest jobs go to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub job_type: String,
    pub queue: String,
}

impl JobSpec {
    pub fn new(release_tag: &str, queue: impl Into<String>) -> Self {
        Self {
            job_type: job_type_for(release_tag),
            queue: queue.into(),
        }
    }
}

/// `job-INGEST_STAGED:<release tag>`
pub fn job_type_for(release_tag: &str) -> String {
    format!("{}:{}", INGEST_JOB_TYPE_PREFIX, release_tag)
}

/// Product metadata block of the ingest parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub tags: Vec<String>,
    pub met_required: bool,
    pub restaged: bool,
    #[serde(rename = "ISL_urls")]
    pub isl_urls: String,
}

/// Parameters of a staged-ingest job.
///
/// `create_hash` and `update_s3_tag` are the strings `"false"`, not booleans;
/// the SDS job reads them as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestJobParams {
    pub id: String,
    pub data_url: String,
    pub data_file: String,
    pub prod_met: ProductMetadata,
    pub create_hash: String,
    pub update_s3_tag: String,
}

/// A fully described job ready to hand to a [`JobSubmitter`](super::JobSubmitter)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestJob {
    pub job_type: String,
    pub queue: String,
    pub tag: String,
    pub params: IngestJobParams,
}

impl IngestJob {
    pub fn for_granule(spec: &JobSpec, granule: &Granule) -> Self {
        Self {
            job_type: spec.job_type.clone(),
            queue: spec.queue.clone(),
            tag: format!("{}{}", INGEST_TAG_PREFIX, granule.filename),
            params: IngestJobParams {
                id: granule.filename.clone(),
                data_url: granule.url.clone(),
                data_file: granule.filename.clone(),
                prod_met: ProductMetadata {
                    tags: vec!["ISL".to_string(), granule.url.clone()],
                    met_required: false,
                    restaged: false,
                    isl_urls: granule.url.clone(),
                },
                create_hash: "false".to_string(),
                update_s3_tag: "false".to_string(),
            },
        }
    }
}

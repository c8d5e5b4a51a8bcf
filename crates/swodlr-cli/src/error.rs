//! Error types for the SWODLR CLI
//!
//! Messages are shown to operators as-is, so each says what to check.

use swodlr_common::SwodlrError;
use swodlr_ingest::IngestError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Error, Debug)]
pub enum CliError {
    /// Event file could not be read
    #[error("Cannot read event '{path}': {source}. Check the path or pipe the event on stdin with '--event -'.")]
    EventRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Event JSON did not match the expected shape
    #[error("Invalid event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    /// The S3 URL given to `swodlr ingest` is unusable
    #[error("Invalid S3 URL: {0}")]
    InvalidUrl(#[from] SwodlrError),

    /// Parameters, SDS, ledger, or step function failure
    #[error("{0}. Check SWODLR_ENV and the SWODLR_* parameters.")]
    Ingest(#[from] IngestError),

    /// Submission produced no job for the requested granule
    #[error("Nothing was submitted for '{0}'. It is either already ingested or the SDS rejected it; rerun with --verbose for details.")]
    NothingSubmitted(String),

    /// The SDS reported a terminal failure
    #[error("Ingest job {job_id} for '{granule_id}' failed. See the ledger entry's traceback for the cause.")]
    JobFailed { granule_id: String, job_id: String },

    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

//! Ingest error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use swodlr_common::SwodlrError;
use thiserror::Error;

use crate::sds::SdsError;
use crate::ledger::LedgerError;

/// Result type alias for ingest operations
pub type IngestResult<T> = std::result::Result<T, IngestError>;

/// Faults raised while handling one record, granule, or receipt.
///
/// Stage loops catch these per item and log them; only the trigger edge
/// (bootstrap, startup) ever hands one to a caller.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error(transparent)]
    Record(#[from] SwodlrError),

    #[error("Failed to ingest granule {granule_id}: {source}")]
    SubmissionFault {
        granule_id: String,
        #[source]
        source: SdsError,
    },

    #[error("Failed to get status of job {job_id}: {source}")]
    StatusQueryFault {
        job_id: String,
        #[source]
        source: SdsError,
    },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("SDS error: {0}")]
    Sds(#[from] SdsError),

    #[error("Failed to start step function execution: {0}")]
    Launch(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match self {
            IngestError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            IngestError::Launch(_) | IngestError::Sds(_) => StatusCode::BAD_GATEWAY,
            IngestError::Record(_) | IngestError::Serialization(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let response = IngestError::Config("stepfunction_arn is not set".into()).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = IngestError::Launch("throttled".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let response = IngestError::Record(SwodlrError::DataNotFound).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_submission_fault_message() {
        let err = IngestError::SubmissionFault {
            granule_id: "test-1".into(),
            source: SdsError::Rejected("queue is paused".into()),
        };
        assert_eq!(
            err.to_string(),
            "Failed to ingest granule test-1: SDS rejected request: queue is paused"
        );
    }
}

//! Error types for SWODLR

use thiserror::Error;

/// Result type alias for SWODLR operations
pub type Result<T> = std::result::Result<T, SwodlrError>;

/// Main error type for SWODLR
#[derive(Error, Debug)]
pub enum SwodlrError {
    /// No file in a notification passed either acceptance rule
    #[error("Data file not found")]
    DataNotFound,

    /// The notification decoded but does not have the expected shape
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SwodlrError {
    /// Whether the error describes a bad inbound record rather than a
    /// problem with this process.
    pub fn is_record_error(&self) -> bool {
        matches!(
            self,
            SwodlrError::DataNotFound
                | SwodlrError::MalformedPayload(_)
                | SwodlrError::Serialization(_)
        )
    }
}

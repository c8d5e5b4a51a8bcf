//! SWODLR Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, parsing, and error handling for the SWODLR ingest-to-SDS
//! workspace.
//!
//! # Overview
//!
//! - **Error Handling**: [`SwodlrError`] and the [`Result`] alias
//! - **Types**: granules, job receipts, ledger entries, and the SDS job status vocabulary
//! - **Notifications**: decoding CNM-R file product messages into [`Granule`]s
//! - **Tiles**: deriving availability keys from successfully ingested granule ids
//! - **Logging**: centralized `tracing` subscriber setup
//!
//! # Example
//!
//! ```no_run
//! use swodlr_common::notification::{parse_notification, ParserConfig};
//!
//! fn handle(body: &str) -> swodlr_common::Result<()> {
//!     let granule = parse_notification(body, &ParserConfig::default())?;
//!     tracing::info!(granule_id = %granule.id, url = %granule.url, "Parsed granule");
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod notification;
pub mod tiles;
pub mod types;

// Re-export commonly used types
pub use error::{Result, SwodlrError};
pub use tiles::AvailabilityKey;
pub use types::{Granule, JobBatch, JobReceipt, JobStatus, LedgerEntry, StatusClass, StatusUpdate};

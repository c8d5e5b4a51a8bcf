//! SWODLR Ingest Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Submits staged SWOT granules to the SDS for ingestion and tracks the
//! resulting jobs until they finish.
//!
//! # Overview
//!
//! - **Submission**: [`submit::SubmissionCoordinator`] parses a queue batch,
//!   skips granules the ledger already reports as ingested, and submits the
//!   rest as SDS jobs
//! - **Polling**: [`poll::StatusReconciler`] checks outstanding jobs, updates
//!   the ledger, and records tile availability on success
//! - **Bootstrap**: [`bootstrap::bootstrap`] hands a trigger event to the
//!   ingest state machine
//! - **Stores**: DynamoDB or in-memory ledger behind [`ledger::IngestLedger`]
//!   and [`ledger::TileIndex`]
//! - **SDS**: Mozart client behind [`sds::JobSubmitter`]
//! - **Configuration**: SSM or environment parameters via
//!   [`config::ParameterSource`]
//!
//! # Example
//!
//! ```no_run
//! use swodlr_ingest::{
//!     config::{load_parameters, IngestSettings},
//!     events::QueueRecord,
//!     services::{IngestServices, LedgerBackend},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let sdk_config = aws_config::load_from_env().await;
//!     let params = load_parameters(&sdk_config).await?;
//!     let settings = IngestSettings::load(params.as_ref())?;
//!     let dynamo = aws_sdk_dynamodb::Client::new(&sdk_config);
//!     let services = IngestServices::connect(&settings, LedgerBackend::DynamoDb(dynamo)).await?;
//!
//!     let record = QueueRecord::for_s3_url("s3://bucket/SWOT_L2_HR_PIXC_001_002_003R_X.nc")?;
//!     let mut jobs = services.coordinator.submit_records(&[record]).await;
//!     while !jobs.is_empty() {
//!         jobs = services.reconciler.poll(&jobs).await;
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod error;
pub mod events;
pub mod ledger;
pub mod middleware;
pub mod poll;
pub mod sds;
pub mod services;
pub mod submit;

// Re-export commonly used types
pub use error::{IngestError, IngestResult};

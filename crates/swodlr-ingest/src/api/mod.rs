//! HTTP trigger surface
//!
//! Exposes each stage as a POST endpoint so an external scheduler can drive
//! the pipeline:
//!
//! - `POST /v1/submit`: queue batch in, job batch out
//! - `POST /v1/poll`: job batch in, remaining job batch out
//! - `POST /v1/bootstrap`: any JSON in, execution ARN out

use std::sync::Arc;

use axum::{extract::State, routing::{get, post}, Json, Router};
use serde_json::{json, Value};
use swodlr_common::JobBatch;

use crate::bootstrap::{bootstrap, ExecutionLauncher};
use crate::error::{IngestError, IngestResult};
use crate::events::QueueEvent;
use crate::poll::StatusReconciler;
use crate::services::IngestServices;
use crate::submit::SubmissionCoordinator;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<SubmissionCoordinator>,
    pub reconciler: Arc<StatusReconciler>,
    /// Unset when no state machine is configured
    pub launcher: Option<Arc<dyn ExecutionLauncher>>,
}

impl AppState {
    pub fn new(services: IngestServices, launcher: Option<Arc<dyn ExecutionLauncher>>) -> Self {
        Self {
            coordinator: services.coordinator,
            reconciler: services.reconciler,
            launcher,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/submit", post(submit))
        .route("/v1/poll", post(poll))
        .route("/v1/bootstrap", post(start_execution))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn submit(State(state): State<AppState>, Json(event): Json<QueueEvent>) -> Json<JobBatch> {
    Json(state.coordinator.submit_records(&event.records).await)
}

async fn poll(State(state): State<AppState>, Json(batch): Json<JobBatch>) -> Json<JobBatch> {
    Json(state.reconciler.poll(&batch).await)
}

async fn start_execution(
    State(state): State<AppState>,
    Json(event): Json<Value>,
) -> IngestResult<Json<Value>> {
    let launcher = state
        .launcher
        .as_ref()
        .ok_or_else(|| IngestError::Config("stepfunction_arn is not configured".to_string()))?;

    let execution_arn = bootstrap(launcher.as_ref(), &event).await?;
    Ok(Json(json!({ "execution_arn": execution_arn })))
}

//! Route tests for the HTTP trigger surface

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use swodlr_ingest::api::{router, AppState};
use swodlr_ingest::bootstrap::ExecutionLauncher;
use swodlr_ingest::services::IngestServices;
use swodlr_ingest::{IngestError, IngestResult};
use tower::ServiceExt;

use common::{job_spec, nc_record, settings_with, FakeSds, FlakyLedger};

struct StubLauncher {
    fail: bool,
    inputs: Mutex<Vec<String>>,
}

#[async_trait]
impl ExecutionLauncher for StubLauncher {
    async fn start_execution(&self, input: &str) -> IngestResult<String> {
        if self.fail {
            return Err(IngestError::Launch("StateMachineDoesNotExist".to_string()));
        }
        self.inputs.lock().unwrap().push(input.to_string());
        Ok("arn:aws:states:us-west-2:000000000000:execution:ingest:1".to_string())
    }
}

struct TestApp {
    router: Router,
    ledger: Arc<FlakyLedger>,
    sds: Arc<FakeSds>,
}

fn app(launcher: Option<Arc<dyn ExecutionLauncher>>) -> TestApp {
    let ledger = FlakyLedger::new();
    let sds = FakeSds::new();
    let services = IngestServices::from_parts(
        &settings_with(&[]),
        ledger.clone(),
        ledger.clone(),
        sds.clone(),
        job_spec(),
    );

    TestApp {
        router: router(AppState::new(services, launcher)),
        ledger,
        sds,
    }
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app(None);

    let response = app
        .router
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "healthy"}));
}

#[tokio::test]
async fn test_submit_then_poll() {
    let app = app(None);
    let event = json!({ "Records": [serde_json::to_value(nc_record("test-1")).unwrap()] });

    let response = app
        .router
        .clone()
        .oneshot(post_json("/v1/submit", event))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let batch = json_body(response).await;
    assert_eq!(batch, json!({"jobs": [{"granule_id": "test-1", "job_id": "job-id-1"}]}));
    assert!(app.ledger.inner.entry("test-1").is_some());

    app.sds.set_status("job-id-1", "job-started", None);
    let response = app.router.oneshot(post_json("/v1/poll", batch.clone())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, batch);
}

#[tokio::test]
async fn test_poll_without_jobs_returns_empty_batch() {
    let app = app(None);

    let response = app.router.oneshot(post_json("/v1/poll", json!({}))).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"jobs": []}));
}

#[tokio::test]
async fn test_bootstrap_without_state_machine() {
    let app = app(None);

    let response = app
        .router
        .oneshot(post_json("/v1/bootstrap", json!({"Records": []})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["error"]["status"], 503);
}

#[tokio::test]
async fn test_bootstrap_starts_execution() {
    let launcher = Arc::new(StubLauncher {
        fail: false,
        inputs: Mutex::new(Vec::new()),
    });
    let app = app(Some(launcher.clone()));

    let response = app
        .router
        .oneshot(post_json("/v1/bootstrap", json!({"Records": [{"body": "{}"}]})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await["execution_arn"],
        "arn:aws:states:us-west-2:000000000000:execution:ingest:1"
    );
    assert_eq!(
        launcher.inputs.lock().unwrap().as_slice(),
        [r#"{"Records":[{"body":"{}"}]}"#.to_string()]
    );
}

#[tokio::test]
async fn test_bootstrap_launch_failure() {
    let launcher = Arc::new(StubLauncher {
        fail: true,
        inputs: Mutex::new(Vec::new()),
    });
    let app = app(Some(launcher));

    let response = app
        .router
        .oneshot(post_json("/v1/bootstrap", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

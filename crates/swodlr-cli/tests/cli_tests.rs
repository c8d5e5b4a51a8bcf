//! End-to-end tests for the swodlr binary
//!
//! Local ingest runs against a mock SDS with an in-memory ledger, so no AWS
//! service is contacted.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

const GRANULE_URL: &str = "s3://podaac-swot-ops-cumulus-protected/SWOT_L2_HR_PIXC_2.0/SWOT_L2_HR_PIXC_001_002_003R_20230101T000000_20230101T000010_PIB0_01.nc";

fn swodlr() -> Command {
    let mut cmd = Command::cargo_bin("swodlr").unwrap();
    cmd.env("SWODLR_ENV", "local")
        .env("AWS_REGION", "us-west-2")
        .env("AWS_EC2_METADATA_DISABLED", "true")
        .env("SWODLR_ingest_table_name", "swodlr-ingest")
        .env("SWODLR_available_tiles_table_name", "swodlr-available-tiles")
        .env("SWODLR_sds_username", "swodlr")
        .env("SWODLR_sds_pcm_release_tag", "2.0.0")
        .env("SWODLR_sds_ingest_queue", "ingest-queue");
    cmd
}

fn envelope(result: serde_json::Value) -> serde_json::Value {
    json!({ "success": true, "message": "", "result": result })
}

async fn mount_sds(server: &MockServer, status: &str) {
    Mock::given(method("POST"))
        .and(path("/mozart/api/v0.1/job/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!("job-7"))))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mozart/api/v0.1/job/info"))
        .and(query_param("id", "job-7"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "status": status, "traceback": "Traceback: disk full" }))),
        )
        .mount(server)
        .await;
}

// ============================================================================
// Argument handling
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let mut cmd = Command::cargo_bin("swodlr").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ingest"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("poll"))
        .stdout(predicate::str::contains("bootstrap"));
}

#[test]
fn test_ingest_requires_url() {
    let mut cmd = Command::cargo_bin("swodlr").unwrap();
    cmd.arg("ingest")
        .assert()
        .failure()
        .stderr(predicate::str::contains("S3_URL"));
}

#[test]
fn test_missing_event_file() {
    swodlr()
        .args(["poll", "--event", "/nonexistent/batch.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read event"));
}

#[test]
fn test_invalid_event_on_stdin() {
    swodlr()
        .arg("submit")
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid event"));
}

#[test]
fn test_missing_parameter() {
    swodlr()
        .env_remove("SWODLR_sds_host")
        .args(["ingest", GRANULE_URL, "--local", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sds_host"));
}

// ============================================================================
// Local ingest
// ============================================================================

#[tokio::test]
async fn test_local_ingest_completes() {
    let server = MockServer::start().await;
    mount_sds(&server, "job-completed").await;

    swodlr()
        .env("SWODLR_sds_host", server.uri())
        .args(["ingest", GRANULE_URL, "--local", "--interval", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("job-7"))
        .stdout(predicate::str::contains("job-completed"))
        .stdout(predicate::str::contains("tile PIXC,1,2,3R"));
}

#[tokio::test]
async fn test_local_ingest_failure_exits_nonzero() {
    let server = MockServer::start().await;
    mount_sds(&server, "job-failed").await;

    swodlr()
        .env("SWODLR_sds_host", server.uri())
        .args(["ingest", GRANULE_URL, "--local", "--interval", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Traceback: disk full"))
        .stderr(predicate::str::contains("job-7"));
}

#[tokio::test]
async fn test_local_ingest_rejected_submission() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/mozart/api/v0.1/job/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "unknown job type"
        })))
        .mount(&server)
        .await;

    swodlr()
        .env("SWODLR_sds_host", server.uri())
        .args(["ingest", GRANULE_URL, "--local", "--interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing was submitted"));
}

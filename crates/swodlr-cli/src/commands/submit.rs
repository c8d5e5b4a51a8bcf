//! `swodlr submit` command implementation
//!
//! Reads a queue batch (`{"Records": [...]}`) and prints the job batch.

use std::path::Path;

use swodlr_ingest::events::QueueEvent;

use crate::commands::{connect, parse_event, print_json};
use crate::error::Result;

pub async fn run(event: &Path) -> Result<()> {
    let event: QueueEvent = parse_event(event)?;
    let services = connect(None).await?;

    let batch = services.coordinator.submit_records(&event.records).await;
    print_json(&batch)
}

//! `swodlr poll` command implementation
//!
//! Reads a job batch and prints the jobs still outstanding.

use std::path::Path;

use swodlr_common::JobBatch;

use crate::commands::{connect, parse_event, print_json};
use crate::error::Result;

pub async fn run(event: &Path) -> Result<()> {
    let batch: JobBatch = parse_event(event)?;
    let services = connect(None).await?;

    let remaining = services.reconciler.poll(&batch).await;
    print_json(&remaining)
}

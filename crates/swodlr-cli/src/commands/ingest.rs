//! `swodlr ingest` command implementation
//!
//! Submits one staged file and polls its job until it is terminal.

use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use swodlr_common::JobReceipt;
use swodlr_ingest::events::QueueRecord;
use swodlr_ingest::ledger::MemoryLedger;
use swodlr_ingest::poll::PollOutcome;
use swodlr_ingest::services::IngestServices;
use tracing::info;

use crate::commands::connect;
use crate::error::{CliError, Result};

/// How the granule's job ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub receipt: JobReceipt,
    pub outcome: PollOutcome,
    /// Status polls made before the job went terminal
    pub polls: usize,
}

pub async fn run(s3_url: &str, interval: Duration, local: bool) -> Result<()> {
    let memory = local.then(|| Arc::new(MemoryLedger::new()));
    let services = connect(memory.clone()).await?;

    let summary = drive(&services, s3_url, interval).await?;

    let outcome = match summary.outcome {
        PollOutcome::Succeeded => "completed".green().bold(),
        _ => "failed".red().bold(),
    };
    println!(
        "{} {} (job {}) after {} poll(s)",
        summary.receipt.granule_id.cyan(),
        outcome,
        summary.receipt.job_id,
        summary.polls
    );

    if let Some(memory) = memory {
        println!();
        println!("{}", "Ledger:".cyan().bold());
        for entry in memory.entries() {
            println!("  {}  {}  {}", entry.granule_id, entry.status, entry.last_check.to_rfc3339());
            if let Some(traceback) = &entry.traceback {
                println!("    {}", traceback.dimmed());
            }
        }
        for tile in memory.tiles() {
            println!("  tile {}", tile.green());
        }
    }

    match summary.outcome {
        PollOutcome::Succeeded => Ok(()),
        _ => Err(CliError::JobFailed {
            granule_id: summary.receipt.granule_id,
            job_id: summary.receipt.job_id,
        }),
    }
}

/// Submit the file at `s3_url`, then poll every `interval` until no job
/// remains outstanding.
pub async fn drive(services: &IngestServices, s3_url: &str, interval: Duration) -> Result<IngestSummary> {
    let record = QueueRecord::for_s3_url(s3_url)?;
    let mut jobs = services
        .coordinator
        .submit_records(std::slice::from_ref(&record))
        .await;

    let receipt = jobs
        .jobs
        .first()
        .cloned()
        .ok_or_else(|| CliError::NothingSubmitted(s3_url.to_string()))?;
    info!(granule_id = %receipt.granule_id, job_id = %receipt.job_id, "Waiting for ingest job");

    let mut polls = 0;
    let mut outcome = PollOutcome::Pending;

    while !jobs.is_empty() {
        tokio::time::sleep(interval).await;

        let report = services.reconciler.reconcile(&jobs).await;
        polls += 1;
        if let Some((_, latest)) = report.outcomes.first() {
            outcome = *latest;
        }
        jobs = report.remaining();
    }

    Ok(IngestSummary {
        receipt,
        outcome,
        polls,
    })
}

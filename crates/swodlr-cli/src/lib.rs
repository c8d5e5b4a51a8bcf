//! SWODLR CLI Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Operator tooling for the SWODLR ingest-to-SDS pipeline.
//!
//! # Overview
//!
//! - **Single granule ingest**: submit one staged file and poll until its
//!   SDS job finishes (`swodlr ingest`)
//! - **One-shot stages**: run the submission, polling, or bootstrap stage on
//!   an event file (`swodlr submit`, `swodlr poll`, `swodlr bootstrap`)

pub mod commands;
pub mod error;

// Re-export commonly used types
pub use error::{CliError, Result};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default seconds between status polls.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 20;

/// SWODLR - ingest staged granules into the SDS
#[derive(Parser, Debug)]
#[command(name = "swodlr")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print the CLI reference as markdown
    #[arg(long, hide = true)]
    pub markdown_help: bool,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit one staged file and poll until its ingest job finishes
    Ingest {
        /// S3 URL of the staged data file
        s3_url: String,

        /// Seconds between status polls
        #[arg(short, long, default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
        interval: u64,

        /// Keep ledger entries in memory instead of DynamoDB
        #[arg(long)]
        local: bool,
    },

    /// Run the submission stage on a queue batch and print the job batch
    Submit {
        /// Event file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },

    /// Run the polling stage on a job batch and print the remaining jobs
    Poll {
        /// Event file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },

    /// Start the ingest state machine with an event
    Bootstrap {
        /// Event file, or '-' for stdin
        #[arg(short, long, default_value = "-")]
        event: PathBuf,
    },
}

//! CLI command implementations
//!
//! Each subcommand has its own module with a `run` function.

pub mod bootstrap;
pub mod ingest;
pub mod poll;
pub mod submit;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use swodlr_ingest::config::{load_parameters, IngestSettings, ParameterSource};
use swodlr_ingest::ledger::MemoryLedger;
use swodlr_ingest::services::{IngestServices, LedgerBackend};

use crate::error::{CliError, Result};

/// Path meaning "read from stdin"
pub const STDIN_PATH: &str = "-";

/// Read an event document from `path`, or stdin for `-`
pub fn read_event(path: &Path) -> Result<String> {
    let display = path.display().to_string();
    let read_error = |source| CliError::EventRead {
        path: display.clone(),
        source,
    };

    if path.as_os_str() == STDIN_PATH {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).map_err(read_error)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path).map_err(read_error)
    }
}

/// Read and decode an event document
pub fn parse_event<T: DeserializeOwned>(path: &Path) -> Result<T> {
    Ok(serde_json::from_str(&read_event(path)?)?)
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Deployment parameters for the current `SWODLR_ENV`
pub async fn parameters() -> Result<(aws_config::SdkConfig, Box<dyn ParameterSource>)> {
    let sdk_config = aws_config::load_from_env().await;
    let params = load_parameters(&sdk_config).await?;
    Ok((sdk_config, params))
}

/// Build both stages, keeping the ledger in `memory` when given
pub async fn connect(memory: Option<Arc<MemoryLedger>>) -> Result<IngestServices> {
    let (sdk_config, params) = parameters().await?;
    let settings = IngestSettings::load(params.as_ref())?;

    let backend = match memory {
        Some(memory) => LedgerBackend::Memory(memory),
        None => LedgerBackend::DynamoDb(aws_sdk_dynamodb::Client::new(&sdk_config)),
    };

    Ok(IngestServices::connect(&settings, backend).await?)
}

//! Step function bootstrap
//!
//! Starts one execution of the ingest state machine with the trigger event
//! as its input.

use async_trait::async_trait;
use aws_sdk_sfn::error::DisplayErrorContext;
use tracing::{info, instrument};

use crate::error::{IngestError, IngestResult};

/// Starts state machine executions
#[async_trait]
pub trait ExecutionLauncher: Send + Sync {
    /// Start an execution with `input` and return its ARN
    async fn start_execution(&self, input: &str) -> IngestResult<String>;
}

/// [`ExecutionLauncher`] over AWS Step Functions
pub struct StepFunctionLauncher {
    client: aws_sdk_sfn::Client,
    state_machine_arn: String,
}

impl StepFunctionLauncher {
    pub fn new(client: aws_sdk_sfn::Client, state_machine_arn: impl Into<String>) -> Self {
        Self {
            client,
            state_machine_arn: state_machine_arn.into(),
        }
    }
}

#[async_trait]
impl ExecutionLauncher for StepFunctionLauncher {
    async fn start_execution(&self, input: &str) -> IngestResult<String> {
        let output = self
            .client
            .start_execution()
            .state_machine_arn(&self.state_machine_arn)
            .input(input)
            .send()
            .await
            .map_err(|e| IngestError::Launch(DisplayErrorContext(e).to_string()))?;

        Ok(output.execution_arn().to_string())
    }
}

/// Serialize `event` compactly and start an execution with it
#[instrument(skip_all)]
pub async fn bootstrap(launcher: &dyn ExecutionLauncher, event: &serde_json::Value) -> IngestResult<String> {
    let input = serde_json::to_string(event)?;
    let execution_arn = launcher.start_execution(&input).await?;
    info!(execution_arn = %execution_arn, "Started step function execution");
    Ok(execution_arn)
}

//! `swodlr bootstrap` command implementation

use std::path::Path;

use serde_json::{json, Value};
use swodlr_ingest::bootstrap::{bootstrap, StepFunctionLauncher};
use swodlr_ingest::config::required;

use crate::commands::{parameters, parse_event, print_json};
use crate::error::Result;

/// Start the ingest state machine with the event and print the execution ARN
pub async fn run(event: &Path) -> Result<()> {
    let event: Value = parse_event(event)?;
    let (sdk_config, params) = parameters().await?;
    let state_machine_arn = required(params.as_ref(), "stepfunction_arn")?;

    let launcher = StepFunctionLauncher::new(aws_sdk_sfn::Client::new(&sdk_config), state_machine_arn);
    let execution_arn = bootstrap(&launcher, &event).await?;

    print_json(&json!({ "execution_arn": execution_arn }))
}

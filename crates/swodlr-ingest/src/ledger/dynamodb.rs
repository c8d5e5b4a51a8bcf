//! DynamoDB-backed ledger and tile index

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::types::{AttributeValue, KeysAndAttributes};
use aws_sdk_dynamodb::Client;
use swodlr_common::{AvailabilityKey, JobStatus, LedgerEntry, StatusUpdate};
use tracing::debug;

use super::{IngestLedger, LedgerError, TileIndex};

/// BatchGetItem accepts at most this many keys per request.
pub const BATCH_GET_LIMIT: usize = 100;

/// Requests per chunk, counting re-requests of unprocessed keys.
pub const MAX_BATCH_GET_ATTEMPTS: usize = 5;

/// Wait before the first re-request; doubles with each further attempt.
pub const UNPROCESSED_RETRY_BASE_DELAY: Duration = Duration::from_millis(50);

fn unprocessed_retry_delay(attempts: usize) -> Duration {
    let exponent = attempts.saturating_sub(1).min(6) as u32;
    UNPROCESSED_RETRY_BASE_DELAY * 2u32.pow(exponent)
}

pub const ATTR_GRANULE_ID: &str = "granule_id";
pub const ATTR_S3_URL: &str = "s3_url";
pub const ATTR_JOB_ID: &str = "job_id";
pub const ATTR_STATUS: &str = "status";
pub const ATTR_LAST_CHECK: &str = "last_check";
pub const ATTR_TRACEBACK: &str = "traceback";
pub const ATTR_TILE_ID: &str = "tile_id";

fn store_error<E>(operation: &'static str, err: E) -> LedgerError
where
    E: std::error::Error,
{
    LedgerError::Store {
        operation,
        message: DisplayErrorContext(err).to_string(),
    }
}

/// Ingest ledger in a DynamoDB table keyed by `granule_id`
#[derive(Clone)]
pub struct DynamoDbLedger {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoDbLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbLedger")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoDbLedger {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key_of(granule_id: &str) -> HashMap<String, AttributeValue> {
        HashMap::from([(ATTR_GRANULE_ID.to_string(), AttributeValue::S(granule_id.to_string()))])
    }

    async fn statuses_chunk(
        &self,
        chunk: &[String],
        found: &mut HashMap<String, JobStatus>,
    ) -> Result<(), LedgerError> {
        let request = KeysAndAttributes::builder()
            .set_keys(Some(chunk.iter().map(|id| Self::key_of(id)).collect()))
            .projection_expression("granule_id, #status")
            .expression_attribute_names("#status", ATTR_STATUS)
            .build()
            .map_err(|e| store_error("BatchGetItem", e))?;

        let mut pending = Some(request);
        let mut attempts = 0;

        while let Some(keys) = pending.take() {
            attempts += 1;

            let response = self
                .client
                .batch_get_item()
                .request_items(&self.table_name, keys)
                .send()
                .await
                .map_err(|e| store_error("BatchGetItem", e))?;

            if let Some(items) = response.responses().and_then(|r| r.get(&self.table_name)) {
                for item in items {
                    let (granule_id, status) = parse_status_item(item)?;
                    found.insert(granule_id, status);
                }
            }

            let unprocessed = response
                .unprocessed_keys()
                .and_then(|u| u.get(&self.table_name))
                .filter(|k| !k.keys().is_empty());

            if let Some(unprocessed) = unprocessed {
                if attempts >= MAX_BATCH_GET_ATTEMPTS {
                    return Err(LedgerError::Unprocessed(attempts));
                }
                let delay = unprocessed_retry_delay(attempts);
                debug!(
                    remaining = unprocessed.keys().len(),
                    attempts,
                    delay_ms = delay.as_millis() as u64,
                    "Re-requesting unprocessed ledger keys"
                );
                pending = Some(unprocessed.clone());
                tokio::time::sleep(delay).await;
            }
        }

        Ok(())
    }
}

fn string_attr<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a String, LedgerError> {
    item.get(name)
        .and_then(|value| value.as_s().ok())
        .ok_or_else(|| LedgerError::MalformedItem(format!("missing string attribute '{}'", name)))
}

fn parse_status_item(item: &HashMap<String, AttributeValue>) -> Result<(String, JobStatus), LedgerError> {
    let granule_id = string_attr(item, ATTR_GRANULE_ID)?;
    let status = string_attr(item, ATTR_STATUS)?;
    Ok((granule_id.clone(), JobStatus::from(status.as_str())))
}

#[async_trait]
impl IngestLedger for DynamoDbLedger {
    async fn statuses(&self, granule_ids: &[String]) -> Result<HashMap<String, JobStatus>, LedgerError> {
        let mut found = HashMap::new();
        for chunk in granule_ids.chunks(BATCH_GET_LIMIT) {
            self.statuses_chunk(chunk, &mut found).await?;
        }
        Ok(found)
    }

    async fn record_submission(&self, entry: &LedgerEntry) -> Result<(), LedgerError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item(ATTR_GRANULE_ID, AttributeValue::S(entry.granule_id.clone()))
            .item(ATTR_S3_URL, AttributeValue::S(entry.s3_url.clone()))
            .item(ATTR_JOB_ID, AttributeValue::S(entry.job_id.clone()))
            .item(ATTR_STATUS, AttributeValue::S(entry.status.to_string()))
            .item(ATTR_LAST_CHECK, AttributeValue::S(entry.last_check.to_rfc3339()));

        if let Some(traceback) = &entry.traceback {
            request = request.item(ATTR_TRACEBACK, AttributeValue::S(traceback.clone()));
        }

        request.send().await.map_err(|e| store_error("PutItem", e))?;
        Ok(())
    }

    async fn update_status(&self, update: &StatusUpdate) -> Result<(), LedgerError> {
        let mut expression = String::from("SET #status = :status, last_check = :last_check");
        let mut request = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .set_key(Some(Self::key_of(&update.granule_id)))
            .expression_attribute_names("#status", ATTR_STATUS)
            .expression_attribute_values(":status", AttributeValue::S(update.status.to_string()))
            .expression_attribute_values(
                ":last_check",
                AttributeValue::S(update.last_check.to_rfc3339()),
            );

        if let Some(traceback) = &update.traceback {
            expression.push_str(", traceback = :traceback");
            request = request.expression_attribute_values(":traceback", AttributeValue::S(traceback.clone()));
        }

        request
            .update_expression(expression)
            .send()
            .await
            .map_err(|e| store_error("UpdateItem", e))?;
        Ok(())
    }
}

/// Availability keys in a DynamoDB table keyed by `tile_id`
#[derive(Clone)]
pub struct DynamoDbTileIndex {
    client: Client,
    table_name: String,
}

impl std::fmt::Debug for DynamoDbTileIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamoDbTileIndex")
            .field("table_name", &self.table_name)
            .finish()
    }
}

impl DynamoDbTileIndex {
    pub fn new(client: Client, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

fn is_put_conditional_check_failed(err: &SdkError<PutItemError>) -> bool {
    match err {
        SdkError::ServiceError(service_err) => {
            matches!(service_err.err(), PutItemError::ConditionalCheckFailedException(_))
        },
        _ => false,
    }
}

#[async_trait]
impl TileIndex for DynamoDbTileIndex {
    async fn insert(&self, key: &AvailabilityKey) -> Result<bool, LedgerError> {
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .item(ATTR_TILE_ID, AttributeValue::S(key.key()))
            .condition_expression("attribute_not_exists(#tile_id)")
            .expression_attribute_names("#tile_id", ATTR_TILE_ID)
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) if is_put_conditional_check_failed(&err) => {
                debug!(tile_id = %key, "Availability key already present");
                Ok(false)
            },
            Err(err) => Err(store_error("PutItem", err)),
        }
    }
}

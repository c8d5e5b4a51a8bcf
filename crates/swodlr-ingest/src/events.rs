//! Inbound trigger payloads

use serde::{Deserialize, Serialize};
use serde_json::json;
use swodlr_common::notification::filename_stem;
use swodlr_common::{Result, SwodlrError};

/// Queue batch delivered to the submission stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

/// One queued message. `body` is a CNM-R JSON document; the delivery
/// metadata only ends up in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub body: String,
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    #[serde(rename = "receiptHandle", default)]
    pub receipt_handle: String,
}

impl QueueRecord {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            message_id: String::new(),
            receipt_handle: String::new(),
        }
    }

    /// Record carrying a minimal CNM-R message for one staged file: the
    /// identifier is the file stem and the only file is the URL itself.
    pub fn for_s3_url(s3_url: &str) -> Result<Self> {
        let name = s3_url
            .rsplit('/')
            .next()
            .filter(|name| !name.is_empty())
            .ok_or_else(|| SwodlrError::MalformedPayload(format!("No file name in '{}'", s3_url)))?;

        let identifier = filename_stem(name);

        let body = json!({
            "identifier": identifier,
            "product": {
                "files": [{ "name": name, "uri": s3_url }]
            }
        });

        Ok(Self::new(serde_json::to_string(&body)?))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use swodlr_common::notification::{parse_notification, ParserConfig};

    #[test]
    fn test_decode_queue_event() {
        let event: QueueEvent = serde_json::from_str(
            r#"{"Records": [{"body": "{}", "messageId": "m-1", "receiptHandle": "r-1", "attributes": {}}]}"#,
        )
        .unwrap();

        assert_eq!(event.records.len(), 1);
        assert_eq!(event.records[0].message_id, "m-1");
        assert_eq!(event.records[0].receipt_handle, "r-1");
    }

    #[test]
    fn test_missing_records_is_empty() {
        let event: QueueEvent = serde_json::from_str("{}").unwrap();
        assert!(event.records.is_empty());
    }

    #[test]
    fn test_record_for_s3_url_parses_back() {
        let url = "s3://podaac-swot-sit/SWOT_L2_HR_PIXC_001_002_003R_20230101T000000_PIB0_01.nc";
        let record = QueueRecord::for_s3_url(url).unwrap();
        let granule = parse_notification(&record.body, &ParserConfig::default()).unwrap();

        assert_eq!(granule.id, "SWOT_L2_HR_PIXC_001_002_003R_20230101T000000_PIB0_01");
        assert_eq!(granule.filename, "SWOT_L2_HR_PIXC_001_002_003R_20230101T000000_PIB0_01.nc");
        assert_eq!(granule.url, url);
    }

    #[test]
    fn test_record_for_url_without_file_name() {
        assert!(QueueRecord::for_s3_url("s3://bucket/dir/").is_err());
    }
}

use crate::errors::{InvalidRecord, Result, StoreUnavailable};
use crate::store::{
    deadline::with_deadline,
    records::{LatestRecord, RecordStore},
};
use async_trait::async_trait;
use aws_sdk_dynamodb::{error::DisplayErrorContext, types::AttributeValue, Client};
use std::collections::HashMap;
use std::time::Duration;

type Item = HashMap<String, AttributeValue>;

/// DynamoDB table holding one item per extraction run.
pub struct DynamoRecordStore {
    client: Client,
    table: String,
    call_timeout: Duration,
}

impl DynamoRecordStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, table: String, call_timeout: Duration) -> Self {
        Self {
            client: Client::new(sdk_config),
            table,
            call_timeout,
        }
    }
}

fn string_attribute(item: &Item, name: &str) -> Option<String> {
    item.get(name).and_then(|value| value.as_s().ok()).cloned()
}

/// An item without a string `hash` is unusable. Missing `filename` or `timestamp`
/// become empty strings; an empty timestamp sorts as the oldest record.
pub(crate) fn parse_item(item: &Item, table: &str) -> Result<LatestRecord> {
    let content_hash = string_attribute(item, "hash").ok_or_else(|| {
        InvalidRecord(format!(
            "item in DynamoDB table {table} has no string attribute \"hash\""
        ))
    })?;

    let optional = |name: &str| {
        string_attribute(item, name).unwrap_or_else(|| {
            tracing::warn!(
                table,
                hash = %content_hash,
                "Item has no string attribute {name:?}, using an empty value"
            );
            String::new()
        })
    };

    let file_name = optional("filename");
    let timestamp = optional("timestamp");

    Ok(LatestRecord {
        content_hash,
        file_name,
        timestamp,
    })
}

/// Parses every usable item, skipping the rest with a warning.
pub(crate) fn parse_items(items: &[Item], table: &str) -> Vec<LatestRecord> {
    items
        .iter()
        .filter_map(|item| match parse_item(item, table) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping record: {e}");
                None
            }
        })
        .collect()
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    fn table(&self) -> &str {
        &self.table
    }

    async fn scan(&self) -> Result<Vec<LatestRecord>> {
        let operation = format!("scan DynamoDB table {}", self.table);

        with_deadline(&operation, self.call_timeout, async {
            let output = self
                .client
                .scan()
                .table_name(&self.table)
                .send()
                .await
                .map_err(|e| {
                    StoreUnavailable(format!("failed to {operation}: {}", DisplayErrorContext(&e)))
                })?;

            if output.last_evaluated_key().is_some() {
                tracing::warn!(
                    table = %self.table,
                    "Scan returned more than one page, only the first is used"
                );
            }

            Ok(parse_items(output.items(), &self.table))
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{memory::MemoryRecordStore, records::lookup_latest};

    fn item(pairs: &[(&str, &str)]) -> Item {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), AttributeValue::S(v.to_string())))
            .collect()
    }

    #[test]
    fn parses_string_attributes() {
        let record = parse_item(
            &item(&[
                ("hash", "abc123"),
                ("filename", "out/data.json"),
                ("timestamp", "2024-01-01T00:00:00Z"),
            ]),
            "file-script",
        )
        .unwrap();

        assert_eq!(
            record,
            LatestRecord {
                content_hash: "abc123".to_string(),
                file_name: "out/data.json".to_string(),
                timestamp: "2024-01-01T00:00:00Z".to_string(),
            }
        );
    }

    #[test]
    fn missing_filename_and_timestamp_become_empty() {
        let record = parse_item(&item(&[("hash", "abc123")]), "file-script").unwrap();
        assert_eq!(
            record,
            LatestRecord {
                content_hash: "abc123".to_string(),
                file_name: String::new(),
                timestamp: String::new(),
            }
        );
    }

    #[test]
    fn missing_hash_is_invalid_record() {
        let result = parse_item(&item(&[("filename", "f")]), "file-script");
        assert_eq!(
            result,
            Err(InvalidRecord(
                "item in DynamoDB table file-script has no string attribute \"hash\"".to_string()
            ))
        );
    }

    #[test]
    fn non_string_hash_is_invalid_record() {
        let mut item = item(&[("filename", "f"), ("timestamp", "t")]);
        item.insert("hash".to_string(), AttributeValue::N("42".to_string()));
        assert!(matches!(parse_item(&item, "t"), Err(InvalidRecord(_))));
    }

    #[tokio::test]
    async fn bad_items_do_not_hide_good_one() {
        let items = vec![
            item(&[("filename", "orphan.json"), ("timestamp", "2030-01-01T00:00:00Z")]),
            item(&[("hash", "no-timestamp"), ("filename", "x.json")]),
            item(&[("hash", "good"), ("timestamp", "2024-01-01T00:00:00Z")]),
        ];

        let records = parse_items(&items, "file-script");
        assert_eq!(records.len(), 2);

        let latest = lookup_latest(&MemoryRecordStore::new(records)).await.unwrap();
        assert_eq!(latest.content_hash, "good");
        assert_eq!(latest.file_name, "");
    }
}

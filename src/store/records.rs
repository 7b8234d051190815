use crate::errors::{EmptyResult, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One extraction run as written by the producer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LatestRecord {
    pub content_hash: String,
    pub file_name: String,
    pub timestamp: String,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Human-readable name of the table, used in error messages.
    fn table(&self) -> &str;

    /// Full scan of the record table, no filtering.
    async fn scan(&self) -> Result<Vec<LatestRecord>>;
}

impl LatestRecord {
    /// Timestamps that do not parse as RFC3339 sort before every valid one.
    pub fn sort_key(&self) -> DateTime<Utc> {
        match DateTime::parse_from_rfc3339(&self.timestamp) {
            Ok(timestamp) => timestamp.with_timezone(&Utc),
            Err(e) => {
                tracing::warn!(
                    hash = %self.content_hash,
                    timestamp = %self.timestamp,
                    "Record timestamp is not RFC3339 ({e}), treating it as the oldest"
                );
                DateTime::<Utc>::MIN_UTC
            }
        }
    }
}

/// Returns the record with the greatest timestamp. Among equal timestamps the one the
/// scan returned first wins.
pub async fn lookup_latest(store: &dyn RecordStore) -> Result<LatestRecord> {
    let records = store.scan().await?;

    let mut keyed: Vec<(DateTime<Utc>, LatestRecord)> = records
        .into_iter()
        .map(|record| (record.sort_key(), record))
        .collect();

    // sort_by is stable
    keyed.sort_by(|(a, _), (b, _)| b.cmp(a));

    let (_, latest) = keyed.into_iter().next().ok_or_else(|| {
        EmptyResult(format!("no items found in DynamoDB table {}", store.table()))
    })?;

    tracing::debug!(
        hash = %latest.content_hash,
        file_name = %latest.file_name,
        timestamp = %latest.timestamp,
        "Found latest record"
    );

    Ok(latest)
}

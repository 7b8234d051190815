//! In-memory stores used by the tests. They mirror the error texts of the AWS-backed
//! stores and keep a log of every call they receive.

use crate::errors::{NotFound, Result, StoreUnavailable};
use crate::store::{
    objects::{ObjectStore, ObjectSummary},
    records::{LatestRecord, RecordStore},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub struct MemoryRecordStore {
    records: Vec<LatestRecord>,
    failure: Option<String>,
    calls: Mutex<usize>,
}

impl MemoryRecordStore {
    pub fn new(records: Vec<LatestRecord>) -> Self {
        Self {
            records,
            failure: None,
            calls: Mutex::new(0),
        }
    }

    pub fn with_hash(hash: &str) -> Self {
        Self::new(vec![LatestRecord {
            content_hash: hash.to_string(),
            file_name: "extract.json".to_string(),
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        }])
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(vec![])
        }
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    fn table(&self) -> &str {
        "memory-table"
    }

    async fn scan(&self) -> Result<Vec<LatestRecord>> {
        *self.calls.lock().unwrap() += 1;
        match &self.failure {
            Some(message) => Err(StoreUnavailable(format!(
                "failed to scan DynamoDB table {}: {message}",
                self.table()
            ))),
            None => Ok(self.records.clone()),
        }
    }
}

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: BTreeMap<String, (Vec<u8>, DateTime<Utc>)>,
    list_failure: Option<String>,
    get_failures: BTreeMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(mut self, key: &str, data: &[u8], last_modified: DateTime<Utc>) -> Self {
        self.objects
            .insert(key.to_string(), (data.to_vec(), last_modified));
        self
    }

    pub fn failing_list(mut self, message: &str) -> Self {
        self.list_failure = Some(message.to_string());
        self
    }

    pub fn failing_get(mut self, key: &str, message: &str) -> Self {
        self.get_failures
            .insert(key.to_string(), message.to_string());
        self
    }

    /// Calls received so far, as `list <prefix>` or `get <key>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.calls.lock().unwrap().push(format!("get {key}"));

        if let Some(message) = self.get_failures.get(key) {
            return Err(StoreUnavailable(format!(
                "failed to get object {key} from S3 bucket {bucket}: {message}"
            )));
        }

        self.objects
            .get(key)
            .map(|(data, _)| data.clone())
            .ok_or_else(|| NotFound(format!("object {key} not found in S3 bucket {bucket}")))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>> {
        self.calls.lock().unwrap().push(format!("list {prefix}"));

        if let Some(message) = &self.list_failure {
            return Err(StoreUnavailable(format!(
                "failed to list objects in S3 bucket {bucket}: {message}"
            )));
        }

        Ok(self
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .take(max_keys.max(0) as usize)
            .map(|(key, (_, last_modified))| ObjectSummary {
                key: key.clone(),
                last_modified: *last_modified,
            })
            .collect())
    }
}

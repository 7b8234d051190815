use crate::errors::{NotFound, Result, StoreUnavailable};
use crate::store::{
    deadline::with_deadline,
    objects::{ObjectStore, ObjectSummary},
};
use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, Client};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// S3-backed object store. The bucket is supplied per call.
pub struct S3ObjectStore {
    client: Client,
    call_timeout: Duration,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &aws_config::SdkConfig, call_timeout: Duration) -> Self {
        // Path-style addressing keeps custom endpoints (MinIO, localstack) working
        let config = aws_sdk_s3::config::Builder::from(sdk_config)
            .force_path_style(sdk_config.endpoint_url().is_some())
            .build();

        Self {
            client: Client::from_conf(config),
            call_timeout,
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let operation = format!("get object {key} from S3 bucket {bucket}");

        with_deadline(&operation, self.call_timeout, async {
            let resp = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().map_or(false, |e| e.is_no_such_key()) {
                        NotFound(format!("object {key} not found in S3 bucket {bucket}"))
                    } else {
                        StoreUnavailable(format!(
                            "failed to {operation}: {}",
                            DisplayErrorContext(&e)
                        ))
                    }
                })?;

            let data = resp.body.collect().await.map_err(|e| {
                StoreUnavailable(format!(
                    "failed to read body of object {key} from S3 bucket {bucket}: {e}"
                ))
            })?;

            Ok(data.into_bytes().to_vec())
        })
        .await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>> {
        let operation = format!("list objects in S3 bucket {bucket}");

        with_deadline(&operation, self.call_timeout, async {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .max_keys(max_keys)
                .send()
                .await
                .map_err(|e| {
                    StoreUnavailable(format!("failed to {operation}: {}", DisplayErrorContext(&e)))
                })?;

            if resp.is_truncated().unwrap_or(false) {
                tracing::warn!(
                    bucket,
                    prefix,
                    max_keys,
                    "Listing was truncated, only the first page is used"
                );
            }

            Ok(resp
                .contents()
                .iter()
                .filter_map(|object| {
                    let key = object.key()?.to_string();
                    let last_modified = object
                        .last_modified()
                        .and_then(|dt| DateTime::from_timestamp(dt.secs(), dt.subsec_nanos()))
                        .unwrap_or(DateTime::<Utc>::MIN_UTC);
                    Some(ObjectSummary { key, last_modified })
                })
                .collect())
        })
        .await
    }
}

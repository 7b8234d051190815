use crate::errors::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Keys ending with this are folder placeholders, not files.
pub const SEPARATOR: char = '/';

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: DateTime<Utc>,
}

impl ObjectSummary {
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with(SEPARATOR)
    }
}

/// Read-only access to a bucket-style object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// A single page of at most `max_keys` objects whose keys start with `prefix`.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
        max_keys: i32,
    ) -> Result<Vec<ObjectSummary>>;
}

/// The most recently modified file key under `prefix`, optionally only among keys
/// ending in `suffix`. Directory markers are never returned.
pub async fn latest_key(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    suffix: Option<&str>,
    max_keys: i32,
) -> Result<Option<String>> {
    let mut objects = store.list_objects(bucket, prefix, max_keys).await?;

    objects.retain(|object| !object.is_directory_marker());
    if let Some(suffix) = suffix {
        objects.retain(|object| object.key.ends_with(suffix));
    }

    objects.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    Ok(objects.into_iter().next().map(|object| object.key))
}

/// File keys under `prefix` with the prefix stripped, in listing order.
pub async fn list_under_prefix(
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
    max_keys: i32,
) -> Result<Vec<String>> {
    let objects = store.list_objects(bucket, prefix, max_keys).await?;

    Ok(objects
        .into_iter()
        .filter(|object| !object.is_directory_marker())
        .filter_map(|object| object.key.strip_prefix(prefix).map(str::to_string))
        .collect())
}

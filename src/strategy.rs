use crate::archive_store::build_zip;
use crate::errors::{EmptyResult, NotFound, Result};
use crate::store::{
    objects::{latest_key, ObjectStore},
    records::{lookup_latest, RecordStore},
};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// How the archive served for a request is located.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Most recently modified object in the bucket, served as is.
    DirectLatest,
    /// Every object in the bucket zipped on the fly, named after the latest hash.
    ZipWholeBucket,
    /// The pre-built `.zip` stored under `<latest hash>/`.
    #[default]
    ZipByHashFolder,
}

/// Bytes ready to be sent along with the name the client should save them under.
#[derive(Debug, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

pub struct Stores<'a> {
    pub records: &'a dyn RecordStore,
    pub objects: &'a dyn ObjectStore,
}

impl Strategy {
    pub async fn resolve(
        self,
        stores: Stores<'_>,
        bucket: &str,
        max_keys: i32,
    ) -> Result<Download> {
        match self {
            Strategy::DirectLatest => {
                let key = latest_key(stores.objects, bucket, "", None, max_keys)
                    .await?
                    .ok_or_else(|| {
                        EmptyResult(format!("no objects found in S3 bucket {bucket}"))
                    })?;

                let bytes = stores.objects.get_object(bucket, &key).await?;
                Ok(Download {
                    file_name: key,
                    bytes,
                })
            }

            Strategy::ZipWholeBucket => {
                let record = lookup_latest(stores.records).await?;
                let bytes = build_zip(stores.objects, bucket, "", max_keys).await?;
                Ok(Download {
                    file_name: format!("{}.zip", record.content_hash),
                    bytes,
                })
            }

            Strategy::ZipByHashFolder => {
                let record = lookup_latest(stores.records).await?;
                let folder = format!("{}/", record.content_hash);

                let key = latest_key(stores.objects, bucket, &folder, Some(".zip"), max_keys)
                    .await?
                    .ok_or_else(|| {
                        NotFound(format!(
                            "no zip file found under {folder} in S3 bucket {bucket}"
                        ))
                    })?;

                let bytes = stores.objects.get_object(bucket, &key).await?;
                Ok(Download {
                    file_name: format!("{}.zip", record.content_hash),
                    bytes,
                })
            }
        }
    }

    fn name(self) -> &'static str {
        match self {
            Strategy::DirectLatest => "direct-latest",
            Strategy::ZipWholeBucket => "zip-whole-bucket",
            Strategy::ZipByHashFolder => "zip-by-hash-folder",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Strategy::DirectLatest,
            Strategy::ZipWholeBucket,
            Strategy::ZipByHashFolder,
        ]
        .into_iter()
        .find(|strategy| strategy.name() == s)
        .ok_or_else(|| {
            format!(
                "unknown archive strategy {s:?}, expected one of direct-latest, \
                 zip-whole-bucket, zip-by-hash-folder"
            )
        })
    }
}

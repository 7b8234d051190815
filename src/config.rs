use crate::strategy::Strategy;
use anyhow::{ensure, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub aws: AwsConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    pub bucket: Option<String>,
    pub strategy: Strategy,
    pub table: String,
    pub max_keys: i32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub call_timeout_secs: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            strategy: Strategy::default(),
            table: "file-script".to_string(),
            max_keys: 1000,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            call_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.archive.max_keys >= 1,
            "archive.max_keys must be at least 1, got {}",
            self.archive.max_keys
        );
        ensure!(
            self.aws.call_timeout_secs >= 1,
            "aws.call_timeout_secs must be at least 1, got {}",
            self.aws.call_timeout_secs
        );
        Ok(())
    }
}

impl ArchiveConfig {
    /// The configured bucket, treating an empty name as unset.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref().filter(|bucket| !bucket.is_empty())
    }
}

impl AwsConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.archive.bucket(), None);
        assert_eq!(config.archive.strategy, Strategy::ZipByHashFolder);
        assert_eq!(config.archive.table, "file-script");
        assert_eq!(config.archive.max_keys, 1000);
        assert_eq!(config.aws.call_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn reads_every_field() {
        let config: Config = toml::from_str(
            r#"
            [archive]
            bucket = "extractions"
            strategy = "zip-whole-bucket"
            table = "runs"
            max_keys = 50

            [aws]
            region = "eu-west-1"
            endpoint = "http://localhost:4566"
            call_timeout_secs = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.archive.bucket(), Some("extractions"));
        assert_eq!(config.archive.strategy, Strategy::ZipWholeBucket);
        assert_eq!(config.archive.table, "runs");
        assert_eq!(config.archive.max_keys, 50);
        assert_eq!(config.aws.region.as_deref(), Some("eu-west-1"));
        assert_eq!(config.aws.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.aws.call_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn empty_bucket_counts_as_unset() {
        let config: Config = toml::from_str("[archive]\nbucket = \"\"").unwrap();
        assert_eq!(config.archive.bucket(), None);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validation_rejects_empty_page_and_zero_timeout() {
        let config: Config = toml::from_str("[archive]\nmax_keys = -5").unwrap();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "archive.max_keys must be at least 1, got -5"
        );

        let config: Config = toml::from_str("[aws]\ncall_timeout_secs = 0").unwrap();
        assert_eq!(
            config.validate().unwrap_err().to_string(),
            "aws.call_timeout_secs must be at least 1, got 0"
        );
    }

    #[test]
    fn rejects_unknown_strategy() {
        assert!(toml::from_str::<Config>("[archive]\nstrategy = \"latest\"").is_err());
    }
}

use crate::config::{self, AwsConfig};
use crate::handler::Handler;
use crate::store::{dynamo::DynamoRecordStore, s3::S3ObjectStore};
use crate::strategy::Strategy;
use anyhow::{anyhow, Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_lambda_events::apigw::ApiGatewayProxyRequest;
use clap::Parser;
use lambda_runtime::{service_fn, LambdaEvent};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CLIArgs {
    /// Optional toml file; flags and environment variables override it
    #[clap(short, long)]
    pub config: Option<String>,

    #[clap(long, env = "bucketName")]
    pub bucket: Option<String>,

    #[clap(long, env = "ARCHIVE_STRATEGY")]
    pub strategy: Option<Strategy>,

    #[clap(long, env = "RECORD_TABLE")]
    pub table: Option<String>,

    #[clap(long, env = "AWS_REGION")]
    pub region: Option<String>,

    #[clap(long, env = "AWS_ENDPOINT_URL")]
    pub endpoint: Option<String>,
}

pub fn load_config(cli_args: CLIArgs) -> Result<config::Config> {
    let mut config: config::Config = match &cli_args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {path}"))?;
            toml::from_str(&text).context("Config is invalid")?
        }
        None => config::Config::default(),
    };

    if cli_args.bucket.is_some() {
        config.archive.bucket = cli_args.bucket;
    }
    if let Some(strategy) = cli_args.strategy {
        config.archive.strategy = strategy;
    }
    if let Some(table) = cli_args.table {
        config.archive.table = table;
    }
    if cli_args.region.is_some() {
        config.aws.region = cli_args.region;
    }
    if cli_args.endpoint.is_some() {
        config.aws.endpoint = cli_args.endpoint;
    }

    config.validate().context("Config is invalid")?;

    Ok(config)
}

async fn load_sdk_config(aws: &AwsConfig) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &aws.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint) = &aws.endpoint {
        loader = loader.endpoint_url(endpoint);
    }
    loader.load().await
}

pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(false)
        .init();

    let config = load_config(CLIArgs::parse())?;

    if config.archive.bucket().is_none() {
        tracing::warn!("S3 bucket name is not set, every request will fail");
    }
    tracing::info!(
        strategy = %config.archive.strategy,
        table = %config.archive.table,
        "Starting archive endpoint"
    );

    let sdk_config = load_sdk_config(&config.aws).await;
    let call_timeout = config.aws.call_timeout();

    let records = DynamoRecordStore::new(&sdk_config, config.archive.table.clone(), call_timeout);
    let objects = S3ObjectStore::new(&sdk_config, call_timeout);

    let handler: &'static Handler = Box::leak(Box::new(Handler::new(
        config.archive,
        Arc::new(records),
        Arc::new(objects),
    )));

    lambda_runtime::run(service_fn(
        move |event: LambdaEvent<ApiGatewayProxyRequest>| handler.serve(event),
    ))
    .await
    .map_err(|e| anyhow!("Lambda runtime failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(config: Option<String>) -> CLIArgs {
        CLIArgs {
            config,
            bucket: None,
            strategy: None,
            table: None,
            region: None,
            endpoint: None,
        }
    }

    fn config_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "latest-archive-{name}-{}.toml",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn bucket_comes_from_environment() {
        std::env::set_var("bucketName", "from-env");

        let from_env = load_config(CLIArgs::try_parse_from(["latest-archive"]).unwrap()).unwrap();
        let from_flag = load_config(
            CLIArgs::try_parse_from(["latest-archive", "--bucket", "from-flag"]).unwrap(),
        )
        .unwrap();

        std::env::remove_var("bucketName");

        assert_eq!(from_env.archive.bucket(), Some("from-env"));
        assert_eq!(from_flag.archive.bucket(), Some("from-flag"));
    }

    #[test]
    fn strategy_flag_is_parsed() {
        let args =
            CLIArgs::try_parse_from(["latest-archive", "--strategy", "zip-whole-bucket"]).unwrap();
        assert_eq!(args.strategy, Some(Strategy::ZipWholeBucket));
        assert!(CLIArgs::try_parse_from(["latest-archive", "--strategy", "newest"]).is_err());
    }

    #[test]
    fn zero_max_keys_is_rejected() {
        let path = config_file("max-keys", "[archive]\nmax_keys = 0");

        let error = load_config(args(Some(path.display().to_string()))).err().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(
            format!("{error:#}"),
            "Config is invalid: archive.max_keys must be at least 1, got 0"
        );
    }

    #[test]
    fn flags_override_file() {
        let path = config_file("flags", "[archive]\nbucket = \"from-file\"\ntable = \"runs\"");

        let config = load_config(CLIArgs {
            bucket: Some("from-flag".to_string()),
            strategy: Some(Strategy::DirectLatest),
            ..args(Some(path.display().to_string()))
        })
        .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.archive.bucket(), Some("from-flag"));
        assert_eq!(config.archive.strategy, Strategy::DirectLatest);
        assert_eq!(config.archive.table, "runs");
    }

    #[test]
    fn no_file_means_defaults() {
        let config = load_config(args(None)).unwrap();
        assert_eq!(config.archive.bucket(), None);
        assert_eq!(config.archive.table, "file-script");
    }

    #[test]
    fn missing_file_is_reported() {
        let error = load_config(args(Some("/nonexistent/latest-archive.toml".to_string())))
            .err()
            .unwrap();
        assert_eq!(
            error.to_string(),
            "Failed to read config from /nonexistent/latest-archive.toml"
        );
    }
}

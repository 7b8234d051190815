mod archive_store;

mod config;

mod errors;

mod handler;

mod init;

mod store {
    pub(crate) mod deadline;
    pub(crate) mod dynamo;
    #[cfg(test)]
    pub(crate) mod memory;
    pub(crate) mod objects;
    pub(crate) mod records;
    pub(crate) mod s3;
}

mod strategy;

mod transport;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    init::main().await
}

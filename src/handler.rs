use crate::config::ArchiveConfig;
use crate::errors::ConfigMissing;
use crate::store::{objects::ObjectStore, records::RecordStore};
use crate::strategy::Stores;
use crate::transport::ApiResponse;
use aws_lambda_events::apigw::{ApiGatewayProxyRequest, ApiGatewayProxyResponse};
use http::{Method, StatusCode};
use lambda_runtime::LambdaEvent;
use std::sync::Arc;

pub struct Handler {
    settings: ArchiveConfig,
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
}

impl Handler {
    pub fn new(
        settings: ArchiveConfig,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Handler {
        Handler {
            settings,
            records,
            objects,
        }
    }

    pub async fn serve(
        &self,
        event: LambdaEvent<ApiGatewayProxyRequest>,
    ) -> Result<ApiGatewayProxyResponse, lambda_runtime::Error> {
        let response = self.handle(&event.payload.http_method).await;
        Ok(response.into_proxy_response())
    }

    pub async fn handle(&self, method: &Method) -> ApiResponse {
        if *method != Method::GET {
            tracing::info!(%method, "Rejecting request");
            return ApiResponse::error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
        }

        let Some(bucket) = self.settings.bucket() else {
            let error = ConfigMissing("S3 bucket name is not set".to_string());
            tracing::error!("{error}");
            return ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, error.to_string());
        };

        let stores = Stores {
            records: self.records.as_ref(),
            objects: self.objects.as_ref(),
        };

        match self
            .settings
            .strategy
            .resolve(stores, bucket, self.settings.max_keys)
            .await
        {
            Ok(download) => {
                tracing::info!(
                    strategy = %self.settings.strategy,
                    bucket,
                    file_name = %download.file_name,
                    size = download.bytes.len(),
                    "Serving archive"
                );
                ApiResponse::attachment(&download)
            }
            Err(e) => {
                tracing::error!(strategy = %self.settings.strategy, bucket, "Request failed: {e}");
                ApiResponse::error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        }
    }
}

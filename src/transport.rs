use crate::strategy::Download;
use aws_lambda_events::{apigw::ApiGatewayProxyResponse, encodings::Body};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// The response to one invocation. Built once, then handed to the runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
    pub status_code: StatusCode,
    pub headers: Vec<(String, String)>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl ApiResponse {
    /// 200 with the bytes base64-encoded as a file download.
    pub fn attachment(download: &Download) -> Self {
        Self {
            status_code: StatusCode::OK,
            headers: vec![
                ("Content-Type".to_string(), "application/zip".to_string()),
                (
                    "Content-Disposition".to_string(),
                    format!("attachment; filename=\"{}\"", download.file_name),
                ),
            ],
            body: STANDARD.encode(&download.bytes),
            is_base64_encoded: true,
        }
    }

    pub fn error(status_code: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body: message.into(),
            is_base64_encoded: false,
        }
    }

    pub fn into_proxy_response(self) -> ApiGatewayProxyResponse {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!(
                    name = %name,
                    value = %value,
                    "Dropping header that is not valid HTTP"
                ),
            }
        }

        ApiGatewayProxyResponse {
            status_code: i64::from(self.status_code.as_u16()),
            headers,
            body: Some(Body::Text(self.body)),
            is_base64_encoded: self.is_base64_encoded,
            ..Default::default()
        }
    }
}

#[cfg(test)]
impl ApiResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

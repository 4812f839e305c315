//! Outbound call to the vision service.
//!
//! # Responsibilities
//! - Issue exactly one `analyze` call per normalized request
//! - Enforce the absolute upstream deadline
//! - Re-check the upload size at the transport boundary
//! - Return the raw outcome; interpretation belongs to the translator
//!
//! No retries: the vision service has a low per-minute ceiling and callers
//! own their backoff policy.

use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap, StatusCode};
use reqwest::RequestBuilder;
use serde::Deserialize;
use thiserror::Error;

use crate::analysis::types::{ImageSource, NormalizedRequest};
use crate::analysis::validator::MAX_UPLOAD_BYTES;
use crate::config::UpstreamConfig;
use crate::observability::metrics;

/// Header carrying the vision service credential.
pub const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Query parameter carrying the comma-joined feature list.
pub const FEATURES_QUERY_PARAM: &str = "visualFeatures";

/// A 2xx response from the vision service.
#[derive(Debug, Clone)]
pub struct UpstreamSuccess {
    /// Opaque; the schema belongs to the vision service.
    pub payload: serde_json::Value,
    pub headers: HeaderMap,
}

/// Everything that can go wrong during the outbound call.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The service answered with a non-2xx status.
    #[error("Vision service responded with {status} ({}): {}", .code.as_deref().unwrap_or("no code"), .message.as_deref().unwrap_or("no message"))]
    Upstream {
        status: StatusCode,
        code: Option<String>,
        message: Option<String>,
        headers: HeaderMap,
    },

    /// No response within the deadline.
    #[error("Vision service did not respond within {}s", .0.as_secs())]
    Timeout(Duration),

    /// DNS resolution failed or the connection was refused.
    #[error("Vision service unreachable: {0}")]
    Unreachable(String),

    #[error("Outbound body of {size} bytes exceeds the {max} byte cap")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("Forwarding failed: {0}")]
    Internal(String),
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    #[serde(default)]
    error: ServiceErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ServiceErrorDetail {
    code: Option<String>,
    message: Option<String>,
}

/// Client for the vision service `analyze` operation.
///
/// Cheap to clone; the connection pool is shared across requests.
#[derive(Clone)]
pub struct VisionClient {
    client: reqwest::Client,
    analyze_url: Option<url::Url>,
    subscription_key: String,
    timeout: Duration,
}

impl VisionClient {
    /// Build a client from the upstream section of the service config.
    ///
    /// A missing or unparseable endpoint does not fail construction; every
    /// call then fails with [`ForwardError::Internal`].
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        let analyze_url = if config.endpoint.trim().is_empty() {
            None
        } else {
            let joined = format!(
                "{}/{}",
                config.endpoint.trim().trim_end_matches('/'),
                config.analyze_path.trim_start_matches('/')
            );
            match url::Url::parse(&joined) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!(endpoint = %config.endpoint, error = %e, "Ignoring invalid vision endpoint");
                    None
                }
            }
        };

        Ok(Self {
            client,
            analyze_url,
            subscription_key: config.subscription_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Perform one `analyze` call.
    pub async fn analyze(
        &self,
        request: &NormalizedRequest,
    ) -> Result<UpstreamSuccess, ForwardError> {
        let endpoint = self
            .analyze_url
            .clone()
            .ok_or_else(|| ForwardError::Internal("vision endpoint is not configured".into()))?;

        let builder = self
            .client
            .post(endpoint)
            .query(&[(FEATURES_QUERY_PARAM, request.features_param())])
            .header(SUBSCRIPTION_KEY_HEADER, self.subscription_key.as_str());

        let builder = match &request.source {
            ImageSource::Url(url) => builder.json(&serde_json::json!({ "url": url })),
            ImageSource::Upload { bytes, .. } => {
                if bytes.len() > MAX_UPLOAD_BYTES {
                    return Err(ForwardError::PayloadTooLarge {
                        size: bytes.len(),
                        max: MAX_UPLOAD_BYTES,
                    });
                }
                builder
                    .header(header::CONTENT_TYPE, "application/octet-stream")
                    .body(bytes.clone())
            }
        };

        let mode = request.source_kind().as_str();
        tracing::debug!(mode = mode, features = %request.features_param(), "Forwarding to vision service");

        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.exchange(builder)).await {
            Ok(result) => result,
            Err(_) => Err(ForwardError::Timeout(self.timeout)),
        };
        metrics::record_upstream(mode, start);

        result
    }

    async fn exchange(&self, builder: RequestBuilder) -> Result<UpstreamSuccess, ForwardError> {
        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        if status.is_success() {
            let payload = serde_json::from_slice(&body).map_err(|e| {
                ForwardError::Internal(format!("vision service returned invalid JSON: {e}"))
            })?;
            return Ok(UpstreamSuccess { payload, headers });
        }

        let detail = serde_json::from_slice::<ServiceErrorBody>(&body)
            .map(|b| b.error)
            .unwrap_or_default();

        Err(ForwardError::Upstream {
            status,
            code: detail.code,
            message: detail.message,
            headers,
        })
    }

    fn classify(&self, error: reqwest::Error) -> ForwardError {
        if error.is_timeout() {
            ForwardError::Timeout(self.timeout)
        } else if error.is_connect() {
            ForwardError::Unreachable(error.to_string())
        } else {
            ForwardError::Internal(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::types::FeatureTag;
    use axum::body::Bytes;

    fn config(endpoint: &str) -> UpstreamConfig {
        UpstreamConfig {
            endpoint: endpoint.to_string(),
            ..UpstreamConfig::default()
        }
    }

    #[test]
    fn test_endpoint_joined_with_analyze_path() {
        let client = VisionClient::new(&config("https://vision.example.com/")).unwrap();
        assert_eq!(
            client.analyze_url.as_ref().unwrap().as_str(),
            "https://vision.example.com/vision/v3.2/analyze"
        );
        assert_eq!(client.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_missing_endpoint_still_constructs() {
        let client = VisionClient::new(&config("")).unwrap();
        assert!(client.analyze_url.is_none());
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_fails_per_request() {
        let client = VisionClient::new(&config("")).unwrap();
        let request = NormalizedRequest {
            source: ImageSource::Url("https://example.com/a.jpg".into()),
            features: FeatureTag::DEFAULTS.to_vec(),
        };
        let err = client.analyze(&request).await.unwrap_err();
        assert!(matches!(err, ForwardError::Internal(_)));
    }

    #[tokio::test]
    async fn test_oversized_upload_capped_at_transport() {
        let client = VisionClient::new(&config("http://127.0.0.1:9")).unwrap();
        let request = NormalizedRequest {
            source: ImageSource::Upload {
                bytes: Bytes::from(vec![0u8; MAX_UPLOAD_BYTES + 1]),
                mime_type: "image/png".into(),
                filename: "big.png".into(),
            },
            features: vec![],
        };
        let err = client.analyze(&request).await.unwrap_err();
        assert!(matches!(err, ForwardError::PayloadTooLarge { .. }));
    }
}

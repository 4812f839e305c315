//! Response and error translation.
//!
//! Turns a forwarder result into the stable [`AnalysisOutcome`] envelope.
//! Classification order for failures:
//!
//! ```text
//! service answered non-2xx  → 429 override, else code lookup table, status preserved
//! no answer: timeout        → 504
//! no answer: dns / refused  → 503
//! anything else             → 500
//! ```
//!
//! Raw service messages and transport errors are logged, never echoed
//! verbatim except for `BadArgument`, whose message is meant for the caller.

use axum::http::{HeaderMap, StatusCode};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::forwarder::{ForwardError, UpstreamSuccess};
use crate::analysis::types::{ImageSource, NormalizedRequest, SourceKind};
use crate::analysis::validator::Rejection;

/// Where a failure originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    /// Caught locally before any network call.
    ValidationRejection,
    /// The vision service answered with a structured failure.
    UpstreamError,
    /// No answer: timeout, DNS, connection refused.
    TransportFailure,
    /// Anything unclassified.
    InternalFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationRejection => "validation",
            ErrorKind::UpstreamError => "upstream",
            ErrorKind::TransportFailure => "transport",
            ErrorKind::InternalFailure => "internal",
        }
    }
}

/// Upload details echoed back for traceability.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadEcho {
    pub filename: String,
    pub size: usize,
    pub mime_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessMetadata {
    pub request_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub features_used: Vec<&'static str>,
    #[serde(flatten)]
    pub upload: Option<UploadEcho>,
}

/// A failure, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub user_message: String,
    pub detail: String,
    pub external_code: Option<String>,
    pub status: StatusCode,
}

/// Terminal artifact of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Success {
        payload: serde_json::Value,
        metadata: SuccessMetadata,
    },
    Failure(Failure),
}

impl AnalysisOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            AnalysisOutcome::Success { .. } => StatusCode::OK,
            AnalysisOutcome::Failure(f) => f.status,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            AnalysisOutcome::Success { .. } => "success",
            AnalysisOutcome::Failure(f) => f.kind.as_str(),
        }
    }
}

impl From<Rejection> for Failure {
    fn from(rejection: Rejection) -> Self {
        Failure {
            kind: ErrorKind::ValidationRejection,
            user_message: rejection.message().to_string(),
            detail: rejection.to_string(),
            external_code: Some(rejection.code().to_string()),
            status: rejection.status(),
        }
    }
}

impl From<Rejection> for AnalysisOutcome {
    fn from(rejection: Rejection) -> Self {
        AnalysisOutcome::Failure(rejection.into())
    }
}

/// Per-request inputs to translation that do not come from the forwarder.
#[derive(Debug, Clone, Copy)]
pub struct TranslationContext<'a> {
    /// Response header the vision service puts its request id in.
    pub request_id_header: &'a str,
    /// Our own inbound request id, used when the service sends none.
    pub inbound_request_id: Option<&'a str>,
}

/// Translate a forwarder result into an outcome.
pub fn translate(
    request: &NormalizedRequest,
    result: Result<UpstreamSuccess, ForwardError>,
    ctx: TranslationContext<'_>,
) -> AnalysisOutcome {
    match result {
        Ok(success) => {
            let metadata = SuccessMetadata {
                request_id: header_value(&success.headers, ctx.request_id_header)
                    .or_else(|| ctx.inbound_request_id.map(String::from)),
                timestamp: Utc::now(),
                features_used: request.feature_names(),
                upload: upload_echo(request),
            };
            AnalysisOutcome::Success {
                payload: success.payload,
                metadata,
            }
        }
        Err(error) => {
            let failure = classify_failure(request.source_kind(), &error);
            match failure.kind {
                ErrorKind::UpstreamError => tracing::warn!(
                    status = failure.status.as_u16(),
                    code = ?failure.external_code,
                    upstream_request_id = ?upstream_request_id(&error, ctx.request_id_header),
                    error = %error,
                    "Vision service rejected request"
                ),
                _ => tracing::error!(
                    kind = failure.kind.as_str(),
                    status = failure.status.as_u16(),
                    error = %error,
                    "Image analysis failed"
                ),
            }
            AnalysisOutcome::Failure(failure)
        }
    }
}

/// Classify a forwarder error. Pure.
pub fn classify_failure(source: SourceKind, error: &ForwardError) -> Failure {
    match error {
        ForwardError::Upstream {
            status,
            code,
            message,
            ..
        } => {
            let (user_message, detail) = if *status == StatusCode::TOO_MANY_REQUESTS {
                (
                    "Rate limit exceeded".to_string(),
                    "Too many requests to the image analysis service. Please wait before retrying."
                        .to_string(),
                )
            } else {
                map_service_code(source, code.as_deref(), message.as_deref())
            };
            Failure {
                kind: ErrorKind::UpstreamError,
                user_message,
                detail,
                external_code: code.clone(),
                status: *status,
            }
        }
        ForwardError::Timeout(limit) => Failure {
            kind: ErrorKind::TransportFailure,
            user_message: "Request timeout".to_string(),
            detail: format!(
                "The image analysis request took too long (over {}s). Try a smaller image.",
                limit.as_secs()
            ),
            external_code: None,
            status: StatusCode::GATEWAY_TIMEOUT,
        },
        ForwardError::Unreachable(_) => Failure {
            kind: ErrorKind::TransportFailure,
            user_message: "Service unavailable".to_string(),
            detail: "Could not reach the image analysis service. Please try again later."
                .to_string(),
            external_code: None,
            status: StatusCode::SERVICE_UNAVAILABLE,
        },
        ForwardError::PayloadTooLarge { size, max } => Rejection::ImageTooLarge {
            size: *size,
            max: *max,
        }
        .into(),
        ForwardError::Internal(_) => Failure {
            kind: ErrorKind::InternalFailure,
            user_message: "Internal server error".to_string(),
            detail: match source {
                SourceKind::Url => "An unexpected error occurred while analyzing the image URL",
                SourceKind::Upload => "An unexpected error occurred while analyzing the uploaded image",
            }
            .to_string(),
            external_code: None,
            status: StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

/// Fixed lookup from vision service error codes to `(user message, detail)`.
fn map_service_code(
    source: SourceKind,
    code: Option<&str>,
    message: Option<&str>,
) -> (String, String) {
    let (user, detail) = match code {
        Some("InvalidImageUrl") => (
            "Invalid or inaccessible image URL",
            "The image URL could not be downloaded. Make sure it is publicly accessible and points directly to an image.",
        ),
        Some("InvalidImageFormat") => (
            "Unsupported image format",
            "The image format is not supported. Use JPEG, PNG, GIF, BMP or WEBP.",
        ),
        Some("InvalidImageSize") => (
            "Invalid image dimensions",
            "Image dimensions must be at least 50x50 pixels and at most 16000x16000 pixels.",
        ),
        Some("InvalidImage") => (
            "Invalid or corrupted image",
            "The image could not be decoded. It may be corrupted or not a real image.",
        ),
        Some("BadArgument") => {
            return (
                "Invalid request parameters".to_string(),
                message
                    .unwrap_or("The image analysis service rejected the request parameters")
                    .to_string(),
            )
        }
        _ => {
            let fallback = match source {
                SourceKind::Url => "Failed to analyze image from URL",
                SourceKind::Upload => "Failed to analyze uploaded image",
            };
            return (
                message.unwrap_or(fallback).to_string(),
                "The image analysis service returned an error".to_string(),
            );
        }
    };
    (user.to_string(), detail.to_string())
}

fn upload_echo(request: &NormalizedRequest) -> Option<UploadEcho> {
    match &request.source {
        ImageSource::Upload {
            bytes,
            mime_type,
            filename,
        } => Some(UploadEcho {
            filename: filename.clone(),
            size: bytes.len(),
            mime_type: mime_type.clone(),
        }),
        ImageSource::Url(_) => None,
    }
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn upstream_request_id(error: &ForwardError, header: &str) -> Option<String> {
    match error {
        ForwardError::Upstream { headers, .. } => header_value(headers, header),
        _ => None,
    }
}

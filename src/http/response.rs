//! Response envelopes.
//!
//! Every endpoint answers with the same JSON family:
//!
//! ```text
//! success: { "success": true,  "data": <service payload>, "metadata": {...} }
//! failure: { "success": false, "error": "...", "details": "...", "code": "..." }
//! ```
//!
//! No stack traces or internal error text ever reach `details`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::analysis::translator::{AnalysisOutcome, Failure, SuccessMetadata};

#[derive(Debug, Serialize)]
pub struct SuccessEnvelope<'a, T: Serialize> {
    pub success: bool,
    pub data: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<&'a SuccessMetadata>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEnvelope<'a> {
    pub success: bool,
    pub error: &'a str,
    pub details: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
}

/// Wrap static data (no metadata) in a success envelope.
pub fn success<T: Serialize>(data: &T) -> Response {
    Json(SuccessEnvelope {
        success: true,
        data,
        metadata: None,
    })
    .into_response()
}

/// Render an error envelope with the given status.
pub fn error(status: StatusCode, error: &str, details: &str, code: Option<&str>) -> Response {
    (
        status,
        Json(ErrorEnvelope {
            success: false,
            error,
            details,
            code,
        }),
    )
        .into_response()
}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        error(
            self.status,
            &self.user_message,
            &self.detail,
            self.external_code.as_deref(),
        )
    }
}

impl IntoResponse for AnalysisOutcome {
    fn into_response(self) -> Response {
        match self {
            AnalysisOutcome::Success { payload, metadata } => Json(SuccessEnvelope {
                success: true,
                data: &payload,
                metadata: Some(&metadata),
            })
            .into_response(),
            AnalysisOutcome::Failure(failure) => failure.into_response(),
        }
    }
}

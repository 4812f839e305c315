//! Endpoint handlers.

use std::time::Instant;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::analysis::types::{AnalysisRequest, FeatureTag, SourceKind, UrlRequest};
use crate::analysis::validator::{
    Rejection, MAX_UPLOAD_BYTES, MAX_URL_LENGTH, MIN_UPLOAD_BYTES, SUPPORTED_MIME_TYPES,
};
use crate::analysis::{self, AnalysisOutcome, TranslationContext};
use crate::http::request::{extract_upload, request_id};
use crate::http::response;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::limits::URL_BODY_LIMIT;

/// `POST /api/v1/analyze/url`
pub async fn analyze_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<UrlRequest>, JsonRejection>,
) -> Response {
    let request = body
        .map(|Json(raw)| AnalysisRequest::Url(raw))
        .map_err(json_rejection);

    respond(&state, &headers, SourceKind::Url, request).await
}

/// Body-limit failures surface as "too large"; everything else is a malformed body.
fn json_rejection(rejection: JsonRejection) -> Rejection {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Rejection::RequestTooLarge {
            limit: URL_BODY_LIMIT,
            max_url: MAX_URL_LENGTH,
        }
    } else {
        Rejection::MalformedBody(rejection.body_text())
    }
}

/// `POST /api/v1/analyze/upload`
pub async fn analyze_upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request = match multipart {
        Ok(multipart) => extract_upload(multipart).await.map(AnalysisRequest::Upload),
        Err(rejection) => Err(Rejection::MalformedMultipart(rejection.body_text())),
    };

    respond(&state, &headers, SourceKind::Upload, request).await
}

async fn respond(
    state: &AppState,
    headers: &HeaderMap,
    mode: SourceKind,
    request: Result<AnalysisRequest, Rejection>,
) -> Response {
    let start = Instant::now();

    let outcome = match request {
        Ok(request) => {
            let ctx = TranslationContext {
                request_id_header: &state.request_id_header,
                inbound_request_id: request_id(headers),
            };
            analysis::run(&state.client, request, ctx).await
        }
        Err(rejection) => {
            tracing::warn!(
                mode = mode.as_str(),
                field = rejection.field(),
                reason = %rejection,
                "Rejected analysis request"
            );
            AnalysisOutcome::from(rejection)
        }
    };

    let status = outcome.status();
    metrics::record_request(mode.as_str(), outcome.kind_label(), status.as_u16(), start);
    tracing::info!(
        mode = mode.as_str(),
        status = status.as_u16(),
        outcome = outcome.kind_label(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Analysis request finished"
    );

    outcome.into_response()
}

#[derive(Debug, Serialize)]
pub struct FeatureInfo {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureCatalog {
    pub features: Vec<FeatureInfo>,
    pub default_features: Vec<&'static str>,
    pub supported_formats: Vec<&'static str>,
    pub max_file_size_bytes: usize,
    pub min_file_size_bytes: usize,
}

/// `GET /api/v1/analyze/features`
pub async fn list_features() -> Response {
    let catalog = FeatureCatalog {
        features: FeatureTag::ALL
            .iter()
            .map(|tag| FeatureInfo {
                name: tag.as_str(),
                description: tag.description(),
            })
            .collect(),
        default_features: FeatureTag::DEFAULTS.iter().map(FeatureTag::as_str).collect(),
        supported_formats: SUPPORTED_MIME_TYPES.to_vec(),
        max_file_size_bytes: MAX_UPLOAD_BYTES,
        min_file_size_bytes: MIN_UPLOAD_BYTES,
    };
    response::success(&catalog)
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// JSON 404 for every unknown route.
pub async fn not_found(uri: Uri) -> Response {
    tracing::debug!(path = %uri.path(), "No route matched");
    response::error(
        StatusCode::NOT_FOUND,
        "Not found",
        &format!("No endpoint at {}", uri.path()),
        None,
    )
}

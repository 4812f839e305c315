//! Image analysis pipeline.
//!
//! # Data Flow
//! ```text
//! UrlRequest / UploadRequest (from http layer)
//!     → validator.rs (checks in order, first failure wins; sanitize)
//!     → NormalizedRequest
//!     → forwarder.rs (one outbound call, 30s deadline)
//!     → translator.rs (success passthrough or error taxonomy)
//!     → AnalysisOutcome (rendered as the JSON envelope)
//! ```
//!
//! # Design Decisions
//! - Validator and translator are pure; the forwarder is the only I/O
//! - A rejection never reaches the forwarder
//! - No retries, no caching, no shared mutable state between requests

pub mod features;
pub mod forwarder;
pub mod sanitize;
pub mod translator;
pub mod types;
pub mod validator;

pub use forwarder::{ForwardError, UpstreamSuccess, VisionClient};
pub use translator::{translate, AnalysisOutcome, ErrorKind, Failure, TranslationContext};
pub use types::{AnalysisRequest, FeatureTag, NormalizedRequest, SourceKind, UploadRequest, UrlRequest};
pub use validator::{validate_upload_request, validate_url_request, Rejection};

/// Run the validator for either entry point.
pub fn validate(request: &AnalysisRequest) -> Result<NormalizedRequest, Rejection> {
    match request {
        AnalysisRequest::Url(raw) => validate_url_request(raw),
        AnalysisRequest::Upload(raw) => validate_upload_request(raw),
    }
}

/// Validate, forward and translate one request.
pub async fn run(
    client: &VisionClient,
    request: AnalysisRequest,
    ctx: TranslationContext<'_>,
) -> AnalysisOutcome {
    let normalized = match validate(&request) {
        Ok(normalized) => normalized,
        Err(rejection) => {
            tracing::warn!(
                mode = request.source_kind().as_str(),
                field = rejection.field(),
                reason = %rejection,
                "Rejected analysis request"
            );
            return rejection.into();
        }
    };

    let result = client.analyze(&normalized).await;
    translate(&normalized, result, ctx)
}

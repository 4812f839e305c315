//! Inbound request extraction.
//!
//! # Responsibilities
//! - Pull the image and feature fields out of a multipart body
//! - Pre-filter non-image parts before the validator sees them
//! - Read the request id assigned by the request-id layer

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::{HeaderMap, StatusCode};

use crate::analysis::types::UploadRequest;
use crate::analysis::validator::{Rejection, FEATURES_FIELD, IMAGE_FIELD};
use crate::security::limits::UPLOAD_BODY_LIMIT;

/// Header set by the request-id layer on every inbound request.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request id assigned to this request, if any.
pub fn request_id(headers: &HeaderMap) -> Option<&str> {
    headers.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Collect the `image` and `features` fields. Other fields are skipped.
pub async fn extract_upload(mut multipart: Multipart) -> Result<UploadRequest, Rejection> {
    let mut upload = UploadRequest::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(IMAGE_FIELD) => {
                if upload.image.is_some() {
                    return Err(Rejection::MalformedMultipart(format!(
                        "send exactly one '{IMAGE_FIELD}' field"
                    )));
                }

                let content_type = field.content_type().unwrap_or_default().to_string();
                if !content_type.to_ascii_lowercase().starts_with("image/") {
                    return Err(Rejection::NotAnImage {
                        field: IMAGE_FIELD,
                        content_type,
                    });
                }

                upload.filename = field.file_name().map(String::from);
                upload.mime_type = Some(content_type);
                upload.image = Some(field.bytes().await.map_err(multipart_rejection)?);
            }
            Some(FEATURES_FIELD) => {
                upload.features = Some(field.text().await.map_err(multipart_rejection)?);
            }
            other => {
                tracing::debug!(field = ?other, "Ignoring unexpected multipart field");
            }
        }
    }

    Ok(upload)
}

/// Body-limit failures surface as "too large"; everything else is malformed input.
fn multipart_rejection(error: MultipartError) -> Rejection {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Rejection::BodyTooLarge {
            limit: UPLOAD_BODY_LIMIT,
        }
    } else {
        Rejection::MalformedMultipart(error.body_text())
    }
}

//! Request validation.
//!
//! # Responsibilities
//! - Decide whether an inbound request is acceptable before any network call
//! - Produce a [`NormalizedRequest`] ready for the forwarder
//! - Reject with enough detail (field, constraint, valid values) for the
//!   caller to self-correct
//!
//! Checks run in a fixed order and the first failure wins.

use axum::http::StatusCode;
use thiserror::Error;

use crate::analysis::features::{resolve_tags, FeatureField};
use crate::analysis::sanitize::sanitize_url;
use crate::analysis::types::{
    FeatureTag, ImageSource, NormalizedRequest, UploadRequest, UrlRequest,
};

/// Longest accepted image URL, in characters.
pub const MAX_URL_LENGTH: usize = 2048;

/// Largest accepted upload (4 MiB).
pub const MAX_UPLOAD_BYTES: usize = 4 * 1024 * 1024;

/// Smallest accepted upload (1 KiB). Anything smaller is almost certainly not an image.
pub const MIN_UPLOAD_BYTES: usize = 1024;

/// MIME types accepted for uploads.
pub const SUPPORTED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/webp",
];

/// Multipart field that carries the image bytes.
pub const IMAGE_FIELD: &str = "image";

/// Multipart / JSON field that carries the feature list.
pub const FEATURES_FIELD: &str = "features";

/// Why a request was refused before reaching the vision service.
///
/// `Display` is the developer-facing detail; [`Rejection::message`] is the
/// short, stable user message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Request body must be a JSON object: {0}")]
    MalformedBody(String),

    #[error("Field 'url' is required and must be a non-empty string")]
    MissingUrl,

    #[error("Field 'url' is not a valid absolute URL: {0}")]
    InvalidUrl(String),

    #[error("URL scheme '{0}' is not allowed; only http and https are accepted")]
    UnsupportedScheme(String),

    #[error("URL is {length} characters long; the maximum is {max}")]
    UrlTooLong { length: usize, max: usize },

    #[error("Request body exceeds the {limit} byte limit; image URLs may be at most {max_url} characters")]
    RequestTooLarge { limit: usize, max_url: usize },

    #[error("Field 'features' must be an array of strings")]
    FeaturesNotList,

    #[error(
        "Invalid features: {}. Valid features are: {}",
        .invalid.join(", "),
        FeatureTag::valid_list()
    )]
    UnknownFeatures { invalid: Vec<String> },

    #[error("Could not read multipart body: {0}")]
    MalformedMultipart(String),

    #[error("Request body exceeds the {limit} byte limit; images may be at most 4MB")]
    BodyTooLarge { limit: usize },

    #[error("No image provided; send the file in the multipart field '{field}'")]
    MissingImage { field: &'static str },

    #[error("Field '{field}' has content type '{content_type}'; only image files are allowed")]
    NotAnImage {
        field: &'static str,
        content_type: String,
    },

    #[error("Image is {size} bytes; the maximum is {max} bytes (4MB)")]
    ImageTooLarge { size: usize, max: usize },

    #[error("Image is {size} bytes; the minimum is {min} bytes, the file is likely invalid")]
    ImageTooSmall { size: usize, min: usize },

    #[error(
        "Unsupported image type '{mime_type}'. Supported types are: {}",
        SUPPORTED_MIME_TYPES.join(", ")
    )]
    UnsupportedMimeType { mime_type: String },
}

impl Rejection {
    /// The request field the rejection is about.
    pub fn field(&self) -> &'static str {
        match self {
            Rejection::MalformedBody(_)
            | Rejection::RequestTooLarge { .. }
            | Rejection::MalformedMultipart(_)
            | Rejection::BodyTooLarge { .. } => "body",
            Rejection::MissingUrl
            | Rejection::InvalidUrl(_)
            | Rejection::UnsupportedScheme(_)
            | Rejection::UrlTooLong { .. } => "url",
            Rejection::FeaturesNotList | Rejection::UnknownFeatures { .. } => FEATURES_FIELD,
            Rejection::MissingImage { field } | Rejection::NotAnImage { field, .. } => *field,
            Rejection::ImageTooLarge { .. }
            | Rejection::ImageTooSmall { .. }
            | Rejection::UnsupportedMimeType { .. } => IMAGE_FIELD,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Rejection::ImageTooLarge { .. }
            | Rejection::BodyTooLarge { .. }
            | Rejection::RequestTooLarge { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            Rejection::UnsupportedMimeType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Stable, user-facing summary.
    pub fn message(&self) -> &'static str {
        match self {
            Rejection::MalformedBody(_) => "Invalid request body",
            Rejection::MissingUrl => "Image URL is required",
            Rejection::InvalidUrl(_) => "Invalid URL format",
            Rejection::UnsupportedScheme(_) => "Only HTTP and HTTPS URLs are allowed",
            Rejection::UrlTooLong { .. } => "URL is too long",
            Rejection::RequestTooLarge { .. } => "Request body too large",
            Rejection::FeaturesNotList => "Features must be an array",
            Rejection::UnknownFeatures { .. } => "Invalid features requested",
            Rejection::MalformedMultipart(_) => "Invalid multipart request",
            Rejection::BodyTooLarge { .. } => "Image file too large",
            Rejection::MissingImage { .. } => "No image file provided",
            Rejection::NotAnImage { .. } => "Only image files are allowed",
            Rejection::ImageTooLarge { .. } => "Image file too large",
            Rejection::ImageTooSmall { .. } => "Image file too small",
            Rejection::UnsupportedMimeType { .. } => "Unsupported image type",
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MalformedBody(_) => "MalformedBody",
            Rejection::MissingUrl => "MissingUrl",
            Rejection::InvalidUrl(_) => "InvalidUrl",
            Rejection::UnsupportedScheme(_) => "UnsupportedScheme",
            Rejection::UrlTooLong { .. } => "UrlTooLong",
            Rejection::RequestTooLarge { .. } => "RequestTooLarge",
            Rejection::FeaturesNotList => "FeaturesNotList",
            Rejection::UnknownFeatures { .. } => "UnknownFeatures",
            Rejection::MalformedMultipart(_) => "MalformedMultipart",
            Rejection::BodyTooLarge { .. } => "BodyTooLarge",
            Rejection::MissingImage { .. } => "MissingImage",
            Rejection::NotAnImage { .. } => "NotAnImage",
            Rejection::ImageTooLarge { .. } => "ImageTooLarge",
            Rejection::ImageTooSmall { .. } => "ImageTooSmall",
            Rejection::UnsupportedMimeType { .. } => "UnsupportedMimeType",
        }
    }
}

/// Validate a URL-mode request.
///
/// The scheme, format and length checks run on the raw string; the
/// forwarded URL is the sanitized one.
pub fn validate_url_request(raw: &UrlRequest) -> Result<NormalizedRequest, Rejection> {
    let url = match &raw.url {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.as_str(),
        _ => return Err(Rejection::MissingUrl),
    };

    let parsed = url::Url::parse(url).map_err(|e| Rejection::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(Rejection::UnsupportedScheme(other.to_string())),
    }

    let length = url.chars().count();
    if length > MAX_URL_LENGTH {
        return Err(Rejection::UrlTooLong {
            length,
            max: MAX_URL_LENGTH,
        });
    }

    let features = match &raw.features {
        None => FeatureTag::DEFAULTS.to_vec(),
        Some(serde_json::Value::Array(items)) => {
            let names = items
                .iter()
                .map(|item| item.as_str().ok_or(Rejection::FeaturesNotList))
                .collect::<Result<Vec<_>, _>>()?;
            resolve_tags(&names).map_err(|invalid| Rejection::UnknownFeatures { invalid })?
        }
        Some(_) => return Err(Rejection::FeaturesNotList),
    };

    let sanitized = sanitize_url(url);

    tracing::info!(
        url = %sanitized,
        features = ?features,
        "Validated URL analysis request"
    );

    Ok(NormalizedRequest {
        source: ImageSource::Url(sanitized),
        features,
    })
}

/// Validate an upload-mode request.
pub fn validate_upload_request(raw: &UploadRequest) -> Result<NormalizedRequest, Rejection> {
    let bytes = raw
        .image
        .as_ref()
        .ok_or(Rejection::MissingImage { field: IMAGE_FIELD })?;

    let size = bytes.len();
    if size > MAX_UPLOAD_BYTES {
        return Err(Rejection::ImageTooLarge {
            size,
            max: MAX_UPLOAD_BYTES,
        });
    }
    if size < MIN_UPLOAD_BYTES {
        return Err(Rejection::ImageTooSmall {
            size,
            min: MIN_UPLOAD_BYTES,
        });
    }

    let mime_type = normalize_mime_type(raw.mime_type.as_deref().unwrap_or_default());
    if !SUPPORTED_MIME_TYPES.contains(&mime_type.as_str()) {
        return Err(Rejection::UnsupportedMimeType { mime_type });
    }

    let features = match raw.features.as_deref().map(str::trim) {
        None | Some("") => FeatureTag::DEFAULTS.to_vec(),
        Some(field) => {
            let names = FeatureField::parse(field).into_names();
            resolve_tags(&names).map_err(|invalid| Rejection::UnknownFeatures { invalid })?
        }
    };

    let filename = sanitize_filename(raw.filename.as_deref().unwrap_or("upload"));

    tracing::info!(
        filename = %filename,
        size = size,
        mime_type = %mime_type,
        features = ?features,
        "Validated upload analysis request"
    );

    Ok(NormalizedRequest {
        source: ImageSource::Upload {
            bytes: bytes.clone(),
            mime_type,
            filename,
        },
        features,
    })
}

/// Strip parameters and lowercase (`image/JPEG; q=1` becomes `image/jpeg`).
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Keep the base name only, without control characters.
fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(|c| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = base.chars().filter(|c| !c.is_control()).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use serde_json::json;

    fn url_request(body: serde_json::Value) -> UrlRequest {
        serde_json::from_value(body).unwrap()
    }

    fn upload(size: usize, mime: &str, features: Option<&str>) -> UploadRequest {
        UploadRequest {
            image: Some(Bytes::from(vec![0u8; size])),
            filename: Some("cat.jpg".into()),
            mime_type: Some(mime.into()),
            features: features.map(String::from),
        }
    }

    #[test]
    fn test_url_defaults_applied_when_features_absent() {
        let req = validate_url_request(&url_request(json!({"url": "https://example.com/cat.jpg"})))
            .unwrap();
        assert_eq!(req.features, FeatureTag::DEFAULTS.to_vec());
        assert!(matches!(req.source, ImageSource::Url(ref u) if u == "https://example.com/cat.jpg"));
    }

    #[test]
    fn test_url_explicit_empty_features_kept_empty() {
        let req = validate_url_request(&url_request(
            json!({"url": "https://example.com/cat.jpg", "features": []}),
        ))
        .unwrap();
        assert!(req.features.is_empty());
        assert_eq!(req.features_param(), "");
    }

    #[test]
    fn test_url_missing_or_empty() {
        assert_eq!(
            validate_url_request(&url_request(json!({}))).unwrap_err(),
            Rejection::MissingUrl
        );
        assert_eq!(
            validate_url_request(&url_request(json!({"url": "   "}))).unwrap_err(),
            Rejection::MissingUrl
        );
        assert_eq!(
            validate_url_request(&url_request(json!({"url": 42}))).unwrap_err(),
            Rejection::MissingUrl
        );
    }

    #[test]
    fn test_url_not_absolute() {
        let err = validate_url_request(&url_request(json!({"url": "cat.jpg"}))).unwrap_err();
        assert!(matches!(err, Rejection::InvalidUrl(_)));
    }

    #[test]
    fn test_url_rejects_non_http_schemes() {
        for url in ["javascript:alert(1)", "file:///etc/passwd", "data:image/png;base64,AAAA", "ftp://example.com/a.jpg"] {
            let err = validate_url_request(&url_request(json!({"url": url}))).unwrap_err();
            assert!(
                matches!(err, Rejection::UnsupportedScheme(_)),
                "{url} should be rejected by scheme, got {err:?}"
            );
        }
    }

    #[test]
    fn test_url_length_limit() {
        let base = "https://example.com/";
        let at_limit = format!("{base}{}", "a".repeat(MAX_URL_LENGTH - base.len()));
        assert!(validate_url_request(&url_request(json!({"url": at_limit}))).is_ok());

        let over = format!("{base}{}", "a".repeat(MAX_URL_LENGTH - base.len() + 1));
        let err = validate_url_request(&url_request(json!({"url": over}))).unwrap_err();
        assert_eq!(
            err,
            Rejection::UrlTooLong {
                length: MAX_URL_LENGTH + 1,
                max: MAX_URL_LENGTH
            }
        );
    }

    #[test]
    fn test_url_features_must_be_list_of_strings() {
        let err = validate_url_request(&url_request(
            json!({"url": "https://example.com/a.jpg", "features": "Tags"}),
        ))
        .unwrap_err();
        assert_eq!(err, Rejection::FeaturesNotList);

        let err = validate_url_request(&url_request(
            json!({"url": "https://example.com/a.jpg", "features": ["Tags", 3]}),
        ))
        .unwrap_err();
        assert_eq!(err, Rejection::FeaturesNotList);
    }

    #[test]
    fn test_url_features_null_is_not_absent() {
        let err = validate_url_request(&url_request(
            json!({"url": "https://example.com/a.jpg", "features": null}),
        ))
        .unwrap_err();
        assert_eq!(err, Rejection::FeaturesNotList);
    }

    #[test]
    fn test_unknown_features_named_in_message() {
        let err = validate_url_request(&url_request(json!({
            "url": "https://example.com/a.jpg",
            "features": ["Tags", "Landmarks", "Celebrities"]
        })))
        .unwrap_err();

        let detail = err.to_string();
        assert!(detail.contains("Landmarks"));
        assert!(detail.contains("Celebrities"));
        assert!(detail.contains(&FeatureTag::valid_list()));
        assert_eq!(err.field(), "features");
    }

    #[test]
    fn test_url_is_sanitized_after_validation() {
        let req = validate_url_request(&url_request(json!({
            "url": "https://example.com/cat.jpg<script>alert(1)</script>"
        })))
        .unwrap();
        assert!(matches!(req.source, ImageSource::Url(ref u) if u == "https://example.com/cat.jpg"));
    }

    #[test]
    fn test_upload_size_boundaries() {
        assert!(validate_upload_request(&upload(MIN_UPLOAD_BYTES, "image/png", None)).is_ok());
        assert!(validate_upload_request(&upload(MAX_UPLOAD_BYTES, "image/png", None)).is_ok());

        assert_eq!(
            validate_upload_request(&upload(MIN_UPLOAD_BYTES - 1, "image/png", None)).unwrap_err(),
            Rejection::ImageTooSmall {
                size: 1023,
                min: MIN_UPLOAD_BYTES
            }
        );

        let err = validate_upload_request(&upload(MAX_UPLOAD_BYTES + 1, "image/png", None)).unwrap_err();
        assert!(matches!(err, Rejection::ImageTooLarge { .. }));
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_upload_missing_image_names_field() {
        let err = validate_upload_request(&UploadRequest::default()).unwrap_err();
        assert_eq!(err, Rejection::MissingImage { field: "image" });
        assert!(err.to_string().contains("'image'"));
    }

    #[test]
    fn test_upload_mime_type_checked() {
        let err = validate_upload_request(&upload(2048, "image/tiff", None)).unwrap_err();
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.to_string().contains("image/webp"));

        assert!(validate_upload_request(&upload(2048, "image/JPEG; charset=binary", None)).is_ok());
    }

    #[test]
    fn test_upload_feature_encodings() {
        let req = validate_upload_request(&upload(2048, "image/jpeg", Some("Tags, Objects"))).unwrap();
        assert_eq!(req.features, vec![FeatureTag::Tags, FeatureTag::Objects]);

        let req = validate_upload_request(&upload(2048, "image/jpeg", Some(r#"["Faces"]"#))).unwrap();
        assert_eq!(req.features, vec![FeatureTag::Faces]);

        let req = validate_upload_request(&upload(2048, "image/jpeg", Some("[]"))).unwrap();
        assert!(req.features.is_empty());

        let req = validate_upload_request(&upload(2048, "image/jpeg", None)).unwrap();
        assert_eq!(req.features, FeatureTag::DEFAULTS.to_vec());
    }

    #[test]
    fn test_upload_unknown_feature_rejects_request() {
        let err = validate_upload_request(&upload(2048, "image/jpeg", Some("Tags, Smiles"))).unwrap_err();
        assert_eq!(
            err,
            Rejection::UnknownFeatures {
                invalid: vec!["Smiles".into()]
            }
        );
    }

    #[test]
    fn test_filename_is_reduced_to_base_name() {
        let mut req = upload(2048, "image/png", None);
        req.filename = Some("../../etc/evil\n.png".into());
        let normalized = validate_upload_request(&req).unwrap();
        match normalized.source {
            ImageSource::Upload { filename, .. } => assert_eq!(filename, "evil.png"),
            other => panic!("unexpected source {other:?}"),
        }
    }
}

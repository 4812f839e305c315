//! Request-scoped analysis types.
//!
//! Nothing here outlives a single request/response cycle.

use std::fmt;
use std::str::FromStr;

use axum::body::Bytes;
use serde::{Deserialize, Deserializer, Serialize};

/// Which entry point a request came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Url,
    Upload,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Url => "url",
            SourceKind::Upload => "upload",
        }
    }
}

/// A kind of analysis the vision service can perform.
///
/// The set is closed; anything else invalidates the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureTag {
    Description,
    Tags,
    Objects,
    Color,
    ImageType,
    Faces,
    Adult,
    Brands,
    Categories,
}

impl FeatureTag {
    /// Every supported tag, in the order they are documented.
    pub const ALL: [FeatureTag; 9] = [
        FeatureTag::Description,
        FeatureTag::Tags,
        FeatureTag::Objects,
        FeatureTag::Color,
        FeatureTag::ImageType,
        FeatureTag::Faces,
        FeatureTag::Adult,
        FeatureTag::Brands,
        FeatureTag::Categories,
    ];

    /// Applied when the caller does not send a feature list at all.
    pub const DEFAULTS: [FeatureTag; 4] = [
        FeatureTag::Description,
        FeatureTag::Tags,
        FeatureTag::Objects,
        FeatureTag::Color,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureTag::Description => "Description",
            FeatureTag::Tags => "Tags",
            FeatureTag::Objects => "Objects",
            FeatureTag::Color => "Color",
            FeatureTag::ImageType => "ImageType",
            FeatureTag::Faces => "Faces",
            FeatureTag::Adult => "Adult",
            FeatureTag::Brands => "Brands",
            FeatureTag::Categories => "Categories",
        }
    }

    /// Human-readable description served by the features endpoint.
    pub fn description(&self) -> &'static str {
        match self {
            FeatureTag::Description => "Generates a human-readable caption describing the image",
            FeatureTag::Tags => "Returns content tags for objects, scenery and actions",
            FeatureTag::Objects => "Detects objects and returns their bounding boxes",
            FeatureTag::Color => "Determines accent, dominant foreground and background colors",
            FeatureTag::ImageType => "Detects whether the image is clip art or a line drawing",
            FeatureTag::Faces => "Detects human faces with age and gender estimates",
            FeatureTag::Adult => "Flags adult, racy or gory content",
            FeatureTag::Brands => "Detects well-known brand logos",
            FeatureTag::Categories => "Categorizes the image using a fixed taxonomy",
        }
    }

    /// Comma-joined names, used in rejection messages.
    pub fn valid_list() -> String {
        Self::ALL.iter().map(FeatureTag::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl fmt::Display for FeatureTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureTag {
    type Err = ();

    /// Case-sensitive: `tags` is not `Tags`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == s).ok_or(())
    }
}

/// Raw inbound request, built per call by the HTTP layer.
#[derive(Debug, Clone)]
pub enum AnalysisRequest {
    Url(UrlRequest),
    Upload(UploadRequest),
}

impl AnalysisRequest {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            AnalysisRequest::Url(_) => SourceKind::Url,
            AnalysisRequest::Upload(_) => SourceKind::Upload,
        }
    }
}

/// Body of `POST /api/v1/analyze/url`.
///
/// Both fields stay untyped so the validator can report a precise reason
/// instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UrlRequest {
    #[serde(default)]
    pub url: Option<serde_json::Value>,
    /// `None` only when the key is absent; an explicit `null` is `Some(Null)`.
    #[serde(default, deserialize_with = "present")]
    pub features: Option<serde_json::Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<serde_json::Value>, D::Error>
where
    D: Deserializer<'de>,
{
    serde_json::Value::deserialize(deserializer).map(Some)
}

/// Upload fields already extracted from a multipart body.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub image: Option<Bytes>,
    pub filename: Option<String>,
    pub mime_type: Option<String>,
    /// The `features` form field, verbatim.
    pub features: Option<String>,
}

/// Where the forwarded image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    Url(String),
    Upload {
        bytes: Bytes,
        mime_type: String,
        filename: String,
    },
}

/// Validated, sanitized, wire-ready projection of an [`AnalysisRequest`].
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub source: ImageSource,
    pub features: Vec<FeatureTag>,
}

impl NormalizedRequest {
    pub fn source_kind(&self) -> SourceKind {
        match self.source {
            ImageSource::Url(_) => SourceKind::Url,
            ImageSource::Upload { .. } => SourceKind::Upload,
        }
    }

    /// `visualFeatures` query value. Empty when the caller sent an empty list.
    pub fn features_param(&self) -> String {
        self.features.iter().map(FeatureTag::as_str).collect::<Vec<_>>().join(",")
    }

    pub fn feature_names(&self) -> Vec<&'static str> {
        self.features.iter().map(FeatureTag::as_str).collect()
    }
}

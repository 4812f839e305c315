//! Validating proxy in front of a cloud image-analysis API.

pub mod analysis;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use analysis::{AnalysisOutcome, FeatureTag, VisionClient};
pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;

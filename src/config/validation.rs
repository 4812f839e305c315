//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Missing credentials are warnings, not errors: the service starts and
//!   every analysis call fails until they are provided

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A semantic problem with an otherwise well-formed config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),

    #[error("upstream.endpoint '{0}' is not an http(s) URL")]
    InvalidEndpoint(String),

    #[error("upstream.timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("upstream.request_id_header '{0}' is not a valid header name")]
    InvalidRequestIdHeader(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a config. Collects every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let endpoint = config.upstream.endpoint.trim();
    if !endpoint.is_empty() {
        let valid = url::Url::parse(endpoint)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidEndpoint(endpoint.to_string()));
        }
    }

    if config.upstream.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    if axum::http::HeaderName::try_from(config.upstream.request_id_header.as_str()).is_err() {
        errors.push(ValidationError::InvalidRequestIdHeader(
            config.upstream.request_id_header.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal problems to log at startup.
pub fn config_warnings(config: &ServiceConfig) -> Vec<String> {
    let mut warnings = Vec::new();
    if config.upstream.endpoint.trim().is_empty() {
        warnings.push(
            "VISION_ENDPOINT is not set; analysis requests will fail until it is configured"
                .to_string(),
        );
    }
    if config.upstream.subscription_key.trim().is_empty() {
        warnings.push(
            "VISION_SUBSCRIPTION_KEY is not set; the vision service will reject analysis requests"
                .to_string(),
        );
    }
    warnings
}

//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{LogFormat, ServiceConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),
}

/// Load configuration: defaults, then the TOML file if given, then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<ServiceConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ServiceConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto a config.
///
/// `lookup` is injected so tests do not touch the process environment.
pub fn apply_env_overrides<F>(config: &mut ServiceConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup("VISION_ENDPOINT") {
        config.upstream.endpoint = endpoint;
    }
    if let Some(key) = lookup("VISION_SUBSCRIPTION_KEY") {
        config.upstream.subscription_key = key;
    }
    if let Some(secs) = lookup("VISION_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
        config.upstream.timeout_secs = secs;
    }

    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    } else if let Some(port) = lookup("PORT").and_then(|v| v.parse::<u16>().ok()) {
        let host = config
            .listener
            .bind_address
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        config.listener.bind_address = format!("{host}:{port}");
    }

    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    match lookup("LOG_FORMAT").as_deref() {
        Some("json") => config.observability.log_format = LogFormat::Json,
        Some("pretty") => config.observability.log_format = LogFormat::Pretty,
        _ => {}
    }
    if let Some(addr) = lookup("METRICS_ADDRESS") {
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = addr;
    }
}

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → config file (TOML, optional)
//!     → environment overrides (.env loaded by main via dotenvy)
//!     → validation.rs (semantic checks, startup warnings)
//!     → ServiceConfig (validated, immutable)
//!     → passed by reference into VisionClient / HttpServer
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; request handling never reads the environment
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ListenerConfig, LogFormat, ObservabilityConfig, ServiceConfig, UpstreamConfig};

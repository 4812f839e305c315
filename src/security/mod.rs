//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (body size caps per route)
//!     → analysis validator (field-level checks, sanitization)
//! Outgoing response:
//!     → headers.rs (nosniff, frame denial, referrer policy)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: size is checked at the body limit, the validator
//!   and again at the forwarder
//! - No trust in client input

pub mod headers;
pub mod limits;

pub use headers::with_security_headers;

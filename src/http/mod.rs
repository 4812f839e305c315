//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware: request id, trace, headers)
//!     → handlers.rs (per-endpoint entry points)
//!     → request.rs (JSON body / multipart extraction, image pre-filter)
//!     → analysis pipeline (validate → forward → translate)
//!     → response.rs (JSON envelope)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer};

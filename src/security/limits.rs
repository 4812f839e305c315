//! Request body limits.
//!
//! # Design Decisions
//! - The upload limit sits well above the 4 MiB image cap so that a slightly
//!   oversized file reaches the validator and gets a precise "too large"
//!   rejection instead of a bare transport error
//! - The URL route only ever needs a small JSON object

use axum::extract::DefaultBodyLimit;

use crate::analysis::validator::MAX_UPLOAD_BYTES;

/// Largest multipart body accepted on the upload route.
pub const UPLOAD_BODY_LIMIT: usize = 2 * MAX_UPLOAD_BYTES + 64 * 1024;

/// Largest JSON body accepted on the URL route.
pub const URL_BODY_LIMIT: usize = 64 * 1024;

pub fn upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)
}

pub fn url_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(URL_BODY_LIMIT)
}

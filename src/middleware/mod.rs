//! HTTP middleware
//!
//! Request tracing and security headers applied to every route.

mod security;
mod tracing;

pub use security::security_headers;
pub use tracing::request_tracing;

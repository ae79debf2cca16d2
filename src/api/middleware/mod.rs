//! Middleware stack for the API
//!
//! Runtime order for each request, outermost first: correlation id →
//! timing → error normalizer → security headers → payload limit →
//! handlers. The assembly in [`crate::api::apply_middleware`] layers
//! them in reverse.

pub mod error_handler;
pub mod layers;
pub mod limits;
pub mod request_id;
pub mod security;
pub mod timing;

// Re-export public API
pub use error_handler::error_handler_middleware;
pub use layers::{compression, cors};
pub use limits::payload_limit_middleware;
pub use request_id::{request_id_middleware, X_REQUEST_ID};
pub use security::security_headers_middleware;
pub use timing::timing_middleware;

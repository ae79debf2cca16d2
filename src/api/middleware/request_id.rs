//! Correlation id middleware
//!
//! Guarantees every request is traceable by a stable identifier shared
//! between logs, the response, and any error envelope. A well-formed
//! client-supplied `x-request-id` is reused so callers can stitch their
//! own request chains together; anything else gets a fresh id.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};

use crate::request_context::RequestContext;

/// Header carrying the correlation id, inbound and outbound.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Upper bound on an accepted inbound id, in bytes.
const MAX_REQUEST_ID_LEN: usize = 128;

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Correlation id middleware.
///
/// Inserts a [`RequestContext`] into the request extensions before any
/// inner stage runs, and echoes the id in the `x-request-id` response
/// header on every response, error responses included. This stage never
/// fails a request.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let started_at = Instant::now();

    let request_id = req
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
        .filter(|candidate| is_well_formed(candidate))
        .map(str::to_owned)
        .unwrap_or_else(generate_request_id);

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    req.extensions_mut().insert(RequestContext {
        request_id: request_id.clone(),
        started_at,
    });

    tracing::debug!(
        method = %method,
        path = %path,
        request_id = %request_id,
        "Incoming request"
    );

    let mut response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = response.status().as_u16(),
        duration_ms = started_at.elapsed().as_millis() as u64,
        request_id = %request_id,
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(X_REQUEST_ID, value);
    }

    response
}

/// Shape sanity for an externally supplied id: non-empty, bounded
/// length, visible ASCII only. Out-of-shape values are discarded so
/// header content cannot corrupt log lines; no further validation.
fn is_well_formed(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_REQUEST_ID_LEN
        && candidate.bytes().all(|b| (0x21..=0x7e).contains(&b))
}

/// Generate a fresh high-entropy id.
///
/// Id generation must never abort a request: if the OS entropy source
/// fails, fall back to a degraded but still process-unique scheme.
fn generate_request_id() -> String {
    let mut bytes = [0u8; 16];
    match getrandom::getrandom(&mut bytes) {
        Ok(()) => uuid::Builder::from_random_bytes(bytes).into_uuid().to_string(),
        Err(_) => fallback_request_id(),
    }
}

/// Degraded scheme: unix milliseconds plus a process-wide counter.
fn fallback_request_id() -> String {
    let sequence = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let unix_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0);
    format!("req-{unix_ms:x}-{sequence:x}")
}

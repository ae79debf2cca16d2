//! Request size limits

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::Error;
use crate::state::AppState;

/// Reject requests whose declared `content-length` exceeds the
/// configured maximum, before the body is read.
///
/// The resulting 413 flows through the error normalizer like any other
/// handler error, so oversized uploads get the standard envelope.
/// Bodies sent without a declared length are bounded by the router's
/// `DefaultBodyLimit` instead.
pub async fn payload_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, Error> {
    let declared = req
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok());

    if let Some(length) = declared {
        if length > state.config.server.max_request_body_size as u64 {
            return Err(Error::PayloadTooLarge("Payload too large".into()));
        }
    }

    Ok(next.run(req).await)
}

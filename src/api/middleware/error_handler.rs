//! Error-normalizing middleware
//!
//! Terminal stage of the pipeline: every failure raised by inner stages
//! or handlers surfaces here as a [`NormalizedError`] payload on the
//! response, and leaves as the uniform JSON envelope
//! `{"error": {code, message, requestId, stack?}}`. Non-error responses
//! pass through untouched.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::{ErrorBody, ErrorEnvelope, NormalizedError, GENERIC_ERROR_MESSAGE};
use crate::request_context::RequestContext;
use crate::state::AppState;

/// Placeholder id for the (unexpected) case of a missing context.
const UNKNOWN_REQUEST_ID: &str = "unknown";

/// Error-normalizing middleware.
///
/// Derives the client-facing status and message, emits one structured
/// error log keyed by correlation id, and rewrites the response body to
/// the envelope. Raw diagnostic detail is disclosed only in development.
/// This stage is not permitted to fail: a serialization fault degrades
/// to a plain-text 500 rather than leaving the request unresolved.
pub async fn error_handler_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_else(|| UNKNOWN_REQUEST_ID.to_owned());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    let Some(normalized) = response.extensions_mut().remove::<NormalizedError>() else {
        return response;
    };

    let status = normalized.status;
    let message = normalized
        .message
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_owned());
    let expose_diagnostics = state.config.environment.expose_diagnostics();

    if expose_diagnostics {
        tracing::error!(
            request_id = %request_id,
            status = status.as_u16(),
            message = %message,
            method = %method,
            path = %path,
            detail = %normalized.diagnostic,
            "Request failed"
        );
    } else {
        tracing::error!(
            request_id = %request_id,
            status = status.as_u16(),
            message = %message,
            method = %method,
            path = %path,
            "Request failed"
        );
    }

    let envelope = ErrorEnvelope {
        error: ErrorBody {
            code: status.as_u16(),
            message,
            request_id: request_id.clone(),
            stack: expose_diagnostics.then_some(normalized.diagnostic),
        },
    };

    match serde_json::to_vec(&envelope) {
        Ok(bytes) => {
            // Keep status and already-set headers; replace only the body.
            let (mut parts, _discarded) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            parts.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                error = %err,
                "Failed to serialize error envelope"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_MESSAGE).into_response()
        }
    }
}

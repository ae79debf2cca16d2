//! System endpoints: health, readiness, ping, service info.
//!
//! These are the in-repo consumers of the request pipeline: they read
//! the correlation id from the [`RequestContext`] the way any business
//! handler would.

use std::time::Instant;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::Utc;
use serde_json::json;

use crate::request_context::RequestContext;
use crate::state::AppState;

/// Comprehensive health check.
pub async fn health(
    State(state): State<AppState>,
    context: Option<Extension<RequestContext>>,
) -> impl IntoResponse {
    let handler_started = Instant::now();
    let request_id = context
        .map(|Extension(ctx)| ctx.request_id)
        .unwrap_or_else(|| "unknown".to_owned());

    tracing::debug!(request_id = %request_id, "Health check");

    Json(json!({
        "ok": true,
        "timestamp": Utc::now().to_rfc3339(),
        "environment": state.config.environment,
        "requestId": request_id,
        "services": {
            "http": "healthy",
        },
        "performance": {
            "responseTimeMs": handler_started.elapsed().as_millis() as u64,
            "uptimeSeconds": state.uptime().as_secs(),
        }
    }))
}

/// Readiness probe for container orchestration.
pub async fn ready() -> impl IntoResponse {
    Json(json!({ "ready": true }))
}

/// Liveness ping.
pub async fn ping() -> impl IntoResponse {
    Json(json!({ "pong": true }))
}

/// Informational root endpoint.
pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "server": "TeleMed Server (Rust)",
            "version": env!("CARGO_PKG_VERSION"),
            "environment": state.config.environment,
            "status": "running"
        })),
    )
}

/// Returns 204 so missing-favicon requests stay out of the error logs.
pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

//! API layer - routes, handlers, and middleware

pub mod handlers;
pub mod middleware;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    let routes = Router::new()
        // Root endpoint
        .route("/", get(handlers::system::root))
        // Health check and probes
        .route("/health", get(handlers::system::health))
        .route("/ready", get(handlers::system::ready))
        .route("/api/ping", get(handlers::system::ping))
        // Favicon handler (returns 204 to prevent 404 logs)
        .route("/favicon.ico", get(handlers::system::favicon));

    apply_middleware(routes, state)
}

/// Attach the shared request-processing pipeline to a router.
///
/// Integration tests use this to wrap scenario-specific routes in the
/// same stack the server runs, so pipeline properties are asserted
/// against the production layering.
pub fn apply_middleware(routes: Router<AppState>, state: AppState) -> Router {
    let max_body_size = state.config.server.max_request_body_size;
    let cors_origins = state.config.server.cors_origins.clone();
    let security_state = state.clone();
    let limit_state = state.clone();
    let error_state = state.clone();

    routes
        .with_state(state)
        // Middleware below is applied in reverse order: the last layer
        // added runs first on the way in.
        .layer(axum::middleware::from_fn_with_state(
            limit_state,
            middleware::payload_limit_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            security_state,
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn_with_state(
            error_state,
            middleware::error_handler_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::timing_middleware))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(middleware::compression())
        .layer(middleware::cors(&cors_origins))
        // Backstop for bodies read without a declared content-length
        .layer(DefaultBodyLimit::max(max_body_size))
}

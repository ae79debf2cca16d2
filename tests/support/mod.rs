//! Shared helpers for integration tests.
//!
//! Routers are built with the production middleware stack via
//! `api::apply_middleware`, so every assertion here runs against the
//! same layering the server uses.

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use telemed::{
    api,
    config::{Config, Environment, LoggingConfig, ServerConfig},
    AppState,
};
use tower::ServiceExt as _;

pub fn test_config(environment: Environment) -> Config {
    Config {
        environment,
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 5000,
            cors_origins: vec![],
            max_request_body_size: 2 * 1024 * 1024,
        },
        logging: LoggingConfig {
            level: "info".into(),
            json: false,
            file_enabled: false,
            file_directory: "logs".into(),
            file_prefix: "telemed".into(),
            file_rotation: "daily".into(),
            service_name: "telemed-server".into(),
        },
    }
}

pub fn test_state(environment: Environment) -> AppState {
    AppState::new(test_config(environment))
}

/// The full application router.
pub fn app(environment: Environment) -> Router {
    api::create_router(test_state(environment))
}

/// Scenario-specific routes wrapped in the production pipeline.
pub fn app_with_routes(environment: Environment, routes: Router<AppState>) -> Router {
    api::apply_middleware(routes, test_state(environment))
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_request_id(uri: &str, request_id: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .header("x-request-id", request_id)
        .body(Body::empty())
        .expect("request")
}

pub async fn send(router: Router, request: Request<Body>) -> Response<Body> {
    router.oneshot(request).await.expect("router call")
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub fn header_str<'r>(response: &'r Response<Body>, name: &str) -> &'r str {
    response
        .headers()
        .get(name)
        .expect("header present")
        .to_str()
        .expect("header is a string")
}

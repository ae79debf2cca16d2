//! Error normalization: envelope shape, message policy, and
//! environment-gated diagnostic disclosure.

#[allow(unused)]
mod support;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    routing::{get, post},
    Router,
};
use telemed::config::Environment;
use telemed::{AppState, Error};

use support::{app_with_routes, body_json, get_with_request_id, header_str, send};

fn failing_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/fail/not-found",
            get(|| async { Err::<(), Error>(Error::NotFound("Not found".into())) }),
        )
        .route(
            "/fail/internal",
            get(|| async {
                Err::<(), Error>(Error::Internal(
                    "connection refused: postgres://telemed-db:5432".into(),
                ))
            }),
        )
        .route(
            "/fail/wrapped",
            get(|| async {
                let err = anyhow::anyhow!("root cause").context("fetching appointment slots");
                Err::<(), Error>(Error::from(err))
            }),
        )
        .route(
            "/fail/unprocessable",
            get(|| async {
                Err::<(), Error>(Error::with_status(422, "invalid CRM number"))
            }),
        )
        .route("/upload", post(|| async { "stored" }))
}

// ---------------------------------------------------------------------------
// Status and message derivation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn declared_status_and_message_pass_through_verbatim() {
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        get_with_request_id("/fail/not-found", "caller-123"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        header_str(&response, header::CONTENT_TYPE.as_str()),
        "application/json"
    );
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 404);
    assert_eq!(body["error"]["message"], "Not found");
    assert_eq!(body["error"]["requestId"], "caller-123");
}

#[tokio::test]
async fn custom_status_codes_are_honored() {
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        get_with_request_id("/fail/unprocessable", "caller-422"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 422);
    assert_eq!(body["error"]["message"], "invalid CRM number");
}

#[tokio::test]
async fn internal_errors_get_the_generic_message() {
    let response = send(
        app_with_routes(Environment::Production, failing_routes()),
        get_with_request_id("/fail/internal", "caller-500"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 500);
    assert_eq!(body["error"]["message"], "internal_error");
    // The raw detail must never appear anywhere in the body.
    assert!(!body.to_string().contains("postgres://"));
}

#[tokio::test]
async fn wrapped_errors_map_to_500() {
    let response = send(
        app_with_routes(Environment::Production, failing_routes()),
        get_with_request_id("/fail/wrapped", "caller-anyhow"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "internal_error");
}

// ---------------------------------------------------------------------------
// Correlation id in the envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn envelope_id_always_matches_the_response_header() {
    // With a generated id (no inbound header)
    let request = Request::builder()
        .method(Method::GET)
        .uri("/fail/not-found")
        .body(Body::empty())
        .unwrap();
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        request,
    )
    .await;

    let header_id = header_str(&response, "x-request-id").to_owned();
    let body = body_json(response).await;
    assert_eq!(body["error"]["requestId"], header_id.as_str());
}

#[tokio::test]
async fn malformed_inbound_id_is_replaced_on_error_responses_too() {
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        get_with_request_id("/fail/not-found", "spaced out id"),
    )
    .await;

    let header_id = header_str(&response, "x-request-id").to_owned();
    assert_ne!(header_id, "spaced out id");
    let body = body_json(response).await;
    assert_eq!(body["error"]["requestId"], header_id.as_str());
}

// ---------------------------------------------------------------------------
// Diagnostic disclosure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stack_is_disclosed_in_development() {
    let response = send(
        app_with_routes(Environment::Development, failing_routes()),
        get_with_request_id("/fail/wrapped", "dev-debug"),
    )
    .await;

    let body = body_json(response).await;
    assert_eq!(body["error"]["message"], "internal_error");
    let stack = body["error"]["stack"].as_str().expect("stack in development");
    assert!(stack.contains("root cause"));
    assert!(stack.contains("fetching appointment slots"));
}

#[tokio::test]
async fn stack_never_appears_outside_development() {
    for environment in [Environment::Test, Environment::Production] {
        for uri in ["/fail/internal", "/fail/wrapped", "/fail/not-found"] {
            let response = send(
                app_with_routes(environment, failing_routes()),
                get_with_request_id(uri, "no-stack"),
            )
            .await;
            let body = body_json(response).await;
            assert!(
                body["error"].get("stack").is_none(),
                "stack leaked for {uri} in {environment}"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Payload limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn oversized_declared_payloads_get_an_enveloped_413() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_LENGTH, "3000000")
        .body(Body::empty())
        .unwrap();
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        request,
    )
    .await;

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        header_str(&response, "x-content-type-options"),
        "nosniff",
        "rejections still pass through the security headers stage"
    );
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], 413);
    assert_eq!(body["error"]["message"], "Payload too large");
    assert!(body["error"]["requestId"].is_string());
}

#[tokio::test]
async fn payloads_within_the_limit_pass() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/upload")
        .header(header::CONTENT_LENGTH, "5")
        .body(Body::from("hello"))
        .unwrap();
    let response = send(
        app_with_routes(Environment::Test, failing_routes()),
        request,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
}

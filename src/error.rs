//! Error types for the TeleMed server
//!
//! Handlers and middleware return [`Error`]; the error-normalizing
//! middleware is the single place that turns one into the client-facing
//! JSON envelope. `IntoResponse` therefore produces only the derived
//! status plus a normalization payload in the response extensions (with
//! a plain-text body as the degraded last-resort shape) and leaves the
//! envelope to the middleware, which has the request context.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Message substituted for errors that carry no client-safe message.
pub const GENERIC_ERROR_MESSAGE: &str = "internal_error";

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    UnprocessableEntity(String),

    /// Any other explicitly declared status, with its own message.
    #[error("{message}")]
    Status { status: StatusCode, message: String },

    /// Internal failure with a message meant for logs, not clients.
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build an error from a numeric status code.
    ///
    /// A code that is not a valid HTTP error status is treated as an
    /// unclassified internal failure (500, generic client message).
    pub fn with_status(code: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match StatusCode::from_u16(code) {
            Ok(status) if status.is_client_error() || status.is_server_error() => {
                Error::Status { status, message }
            }
            _ => Error::Internal(message),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Error::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Status { status, .. } => *status,
            Error::Internal(_) | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message sent to clients, if this error declares one.
    ///
    /// `Internal` and wrapped errors declare none; the normalizer
    /// substitutes [`GENERIC_ERROR_MESSAGE`] so internal detail never
    /// reaches the response body. An empty declared message is treated
    /// as absent.
    pub fn client_message(&self) -> Option<String> {
        match self {
            Error::Internal(_) | Error::Other(_) => None,
            _ => {
                let message = self.to_string();
                (!message.is_empty()).then_some(message)
            }
        }
    }

    /// Raw detail for logs and development-mode envelopes.
    pub fn diagnostic(&self) -> String {
        match self {
            // Debug of anyhow prints the full cause chain.
            Error::Other(err) => format!("{err:?}"),
            other => format!("{other:?}"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.client_message();
        let diagnostic = self.diagnostic();

        let body = message
            .clone()
            .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_owned());
        let mut response = (status, body).into_response();
        response.extensions_mut().insert(NormalizedError {
            status,
            message,
            diagnostic,
        });
        response
    }
}

/// Normalization payload attached to error responses for the
/// error-handling middleware to consume.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedError {
    pub status: StatusCode,
    pub message: Option<String>,
    pub diagnostic: String,
}

/// Client-facing error body: `{"error": {code, message, requestId, stack?}}`.
#[derive(Debug, Serialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

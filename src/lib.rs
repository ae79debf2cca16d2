//! TeleMed Server - Rust implementation
//!
//! HTTP backend for the TeleMed platform. Every inbound request runs
//! through a shared processing pipeline:
//! - correlation id assignment (`x-request-id` honored or generated)
//! - latency instrumentation with slow-request reporting
//! - centralized error normalization into a stable JSON envelope
//!
//! Business features (scheduling, consultations, records) attach their
//! handlers downstream of this pipeline and interact with it through the
//! [`request_context::RequestContext`] and [`error::Error`] types.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod request_context;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;

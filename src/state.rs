//! Shared application state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::Config;

/// Read-only state shared by all requests.
///
/// Everything here is immutable after startup; request-scoped data lives
/// in the request extensions, never in shared state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    started_at: Instant,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            started_at: Instant::now(),
        }
    }

    /// Time since the state was created, for the health endpoint.
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

//! Per-request context injected by middleware.

use std::time::Instant;

/// Request-scoped data shared by the pipeline stages and handlers.
///
/// Created once per request by the correlation middleware, before any
/// business logic runs, and carried in the request's extension map so it
/// is dropped with the request. Never stored in process-wide state.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id for this request. Assigned once, immutable after.
    pub request_id: String,
    /// Monotonic clock reading captured at the entry of the pipeline.
    pub started_at: Instant,
}

impl RequestContext {
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            started_at: Instant::now(),
        }
    }
}

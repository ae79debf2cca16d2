//! Request timing middleware
//!
//! Measures end-to-end latency and surfaces slow requests without
//! altering response semantics. Completion is observed at the end of the
//! response body stream rather than at handler return, so streamed and
//! late-finalized responses are measured in full, and aborted
//! connections are still accounted for.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use http_body::Body as HttpBody;

use crate::request_context::RequestContext;

/// Requests taking strictly longer than this are flagged.
const SLOW_REQUEST_THRESHOLD: Duration = Duration::from_millis(300);

/// Timing middleware.
///
/// Attempts to set a `Server-Timing` response header when headers are
/// produced, and wraps the response body so the slow-request check runs
/// when the body actually finishes (or the connection is dropped). This
/// stage never fails a request; header-write failures are discarded.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let context = req.extensions().get::<RequestContext>();
    let started_at = context
        .map(|ctx| ctx.started_at)
        .unwrap_or_else(Instant::now);
    let request_id = context
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_else(|| "unknown".to_owned());

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let mut response = next.run(req).await;

    // Best-effort: an unrepresentable header value is dropped, the
    // response is sent without it.
    if let Ok(value) = HeaderValue::from_str(&server_timing_value(started_at.elapsed())) {
        response.headers_mut().insert("server-timing", value);
    }

    let observer = ResponseObserver {
        method,
        path,
        status: response.status(),
        request_id,
        started_at,
    };

    response.map(|body| {
        Body::new(TimedBody {
            inner: body,
            observer: Some(observer),
        })
    })
}

/// `Server-Timing` value in the form browsers and client tooling parse:
/// `total;dur=<milliseconds>`.
fn server_timing_value(elapsed: Duration) -> String {
    format!("total;dur={:.1}", elapsed.as_secs_f64() * 1000.0)
}

fn exceeds_threshold(elapsed: Duration) -> bool {
    elapsed > SLOW_REQUEST_THRESHOLD
}

/// Completion data for one request, fired exactly once.
struct ResponseObserver {
    method: Method,
    path: String,
    status: StatusCode,
    request_id: String,
    started_at: Instant,
}

impl ResponseObserver {
    fn complete(self, aborted: bool) {
        let elapsed = self.started_at.elapsed();
        if exceeds_threshold(elapsed) {
            tracing::warn!(
                method = %self.method,
                path = %self.path,
                status = self.status.as_u16(),
                request_id = %self.request_id,
                duration_ms = elapsed.as_millis() as u64,
                aborted,
                "Slow request"
            );
        }
    }
}

/// Response body wrapper that reports completion.
///
/// Fires the observer when the inner stream ends; if the body is dropped
/// before that (client disconnect, connection reset), the drop path
/// fires it instead.
struct TimedBody {
    inner: Body,
    observer: Option<ResponseObserver>,
}

impl HttpBody for TimedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<http_body::Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Ready(None) => {
                if let Some(observer) = this.observer.take() {
                    observer.complete(false);
                }
                Poll::Ready(None)
            }
            other => other,
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> http_body::SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TimedBody {
    fn drop(&mut self) {
        if let Some(observer) = self.observer.take() {
            observer.complete(true);
        }
    }
}

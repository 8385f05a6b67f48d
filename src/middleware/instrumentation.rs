//! Per-request instrumentation.
//!
//! Installs a `request` span (request id, method, path) into the request scope,
//! runs the inner service inside it, and emits exactly one `request completed`
//! record with the observed status and elapsed time.
//!
//! The layer only reads the response status. Request extensions (including
//! hyper's upgrade handle) and the response body pass through untouched, so
//! protocol upgrades and streamed bodies behave exactly as without it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::http::{Request, Response, StatusCode};
use tower::{Layer, Service};
use tower_http::request_id::RequestId;
use tracing::{Instrument, Span};
use uuid::Uuid;

use crate::api::v1::extractors::RequestScope;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

// ---------------------------------------------------------------------------
// RequestInstrumentationLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestInstrumentationLayer;

impl<S> Layer<S> for RequestInstrumentationLayer {
    type Service = RequestInstrumentation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestInstrumentation { inner }
    }
}

// ---------------------------------------------------------------------------
// RequestInstrumentation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RequestInstrumentation<S> {
    inner: S,
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestInstrumentation<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Future: Send + 'static,
    S::Error: 'static,
    ResBody: Send + 'static,
{
    type Response = Response<ResBody>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let request_id = correlation_id(&req);
        let span = tracing::info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        RequestScope::attach(req.extensions_mut()).set_logger(span.clone());

        let mut completion = CompletionLog::start(span.clone());
        let fut = {
            let _entered = span.enter();
            self.inner.call(req)
        };

        Box::pin(
            async move {
                let result = fut.await;
                match &result {
                    Ok(res) => completion.observe(res.status()),
                    // Inner errors surface to clients as 500.
                    Err(_) => completion.observe(StatusCode::INTERNAL_SERVER_ERROR),
                }
                completion.finish();
                result
            }
            .instrument(span),
        )
    }
}

/// Request id assigned upstream (`SetRequestIdLayer`), else the raw header,
/// else a fresh UUID.
fn correlation_id<B>(req: &Request<B>) -> String {
    req.extensions()
        .get::<RequestId>()
        .map(RequestId::header_value)
        .or_else(|| req.headers().get(REQUEST_ID_HEADER))
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

// ---------------------------------------------------------------------------
// Response observation
// ---------------------------------------------------------------------------

/// Status written by the downstream handler; 200 until one is observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResponseObservation {
    status: Option<StatusCode>,
}

impl ResponseObservation {
    /// Keeps the first status observed.
    pub fn observe(&mut self, status: StatusCode) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::OK)
    }
}

/// Emits the completion record when dropped, so the record is written once on
/// every path: normal return, unwinding, or the future being dropped early.
struct CompletionLog {
    span: Span,
    started: Instant,
    observation: ResponseObservation,
    completed: bool,
}

impl CompletionLog {
    fn start(span: Span) -> Self {
        Self {
            span,
            started: Instant::now(),
            observation: ResponseObservation::default(),
            completed: false,
        }
    }

    fn observe(&mut self, status: StatusCode) {
        self.observation.observe(status);
    }

    fn finish(mut self) {
        self.completed = true;
    }
}

impl Drop for CompletionLog {
    fn drop(&mut self) {
        let elapsed = self.started.elapsed();
        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        let status = self.observation.status();

        if status.is_server_error() {
            tracing::warn!(
                parent: &self.span,
                status = status.as_u16(),
                duration = ?elapsed,
                duration_ms,
                completed = self.completed,
                "request completed"
            );
        } else {
            tracing::info!(
                parent: &self.span,
                status = status.as_u16(),
                duration = ?elapsed,
                duration_ms,
                completed = self.completed,
                "request completed"
            );
        }
    }
}

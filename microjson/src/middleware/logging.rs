use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;

use super::request_id::RequestId;

/// Runs every request inside its own `request` span and logs one line when it completes.
///
/// Anything the handler logs, including recovered panics and publish failures, is attached to
/// that span. Install it inside [`request_id`](super::request_id::request_id) so the span carries
/// the request id.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_owned());
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let span = tracing::info_span!("request", %method, %uri, %request_id);
    let start = Instant::now();

    let response = next.run(req).instrument(span.clone()).await;

    let latency_ms = start.elapsed().as_millis() as u64;
    span.in_scope(|| log_request_event(response.status().as_u16(), route.as_deref(), latency_ms));

    response
}

fn log_request_event(status: u16, route: Option<&str>, latency_ms: u64) {
    let route = route.unwrap_or("<unmatched>");
    if status >= 500 {
        tracing::error!(status, route, latency_ms, "Request");
    } else if status >= 400 {
        tracing::warn!(status, route, latency_ms, "Request");
    } else {
        tracing::info!(status, route, latency_ms, "Request");
    }
}

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::AppState;

/// Scrapes of this path are not counted.
const SCRAPE_PATH: &str = "/metrics";

/// Label for requests no route matched; raw paths would grow series unbounded.
pub const UNMATCHED_PATH: &str = "unmatched";

/// Records `http_request_duration_seconds{status_code, method, path}` for
/// every request except the scrape itself.
///
/// `path` is the matched route template, or [`UNMATCHED_PATH`] when the
/// router found none, so clients cannot mint new series at will.
pub async fn track_http_metrics(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = match req.extensions().get::<MatchedPath>() {
        Some(matched) => matched.as_str().to_owned(),
        None => UNMATCHED_PATH.to_owned(),
    };

    let start = Instant::now();
    let response = next.run(req).await;
    let elapsed = start.elapsed();

    if path != SCRAPE_PATH {
        let status = response.status().as_u16();
        state
            .metrics
            .observe_http(method.as_str(), &path, status, elapsed.as_secs_f64());
        tracing::debug!(
            %method,
            %path,
            status,
            us = elapsed.as_micros() as u64,
            "request observed"
        );
    }

    response
}

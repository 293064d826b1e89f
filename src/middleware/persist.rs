use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field, Instrument};

use crate::db::RequestRecord;
use crate::AppState;

/// Persists a `RequestRecord` for every request once its response is complete.
///
/// The response body carries a `CompletionGuard`; when the server is done
/// with the body (fully written, or abandoned by the client) the guard
/// measures the elapsed time and spawns the insert. A failed insert never
/// changes what the client sees.
pub async fn persist_request(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let response = next.run(req).await;

    let guard = CompletionGuard {
        state,
        method,
        path,
        status_code: response.status().as_u16(),
        start,
    };

    response.map(|body| {
        Body::new(body.map_frame(move |frame| {
            let _armed = &guard;
            frame
        }))
    })
}

/// Fires the post-response insert when dropped along with the response body.
struct CompletionGuard {
    state: Arc<AppState>,
    method: String,
    path: String,
    status_code: u16,
    start: Instant,
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        let record = RequestRecord {
            path: std::mem::take(&mut self.path),
            method: std::mem::take(&mut self.method),
            status_code: self.status_code,
            response_time: self.start.elapsed().as_secs_f64(),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(store_request(self.state.clone(), record));
            }
            Err(_) => tracing::warn!(path = %record.path, "no runtime to store request record"),
        }
    }
}

/// Insert one record inside a `store-request-metrics` span. Errors are logged
/// into the span and swallowed.
pub async fn store_request(state: Arc<AppState>, record: RequestRecord) {
    let span = tracing::info_span!(
        "store-request-metrics",
        http.method = %record.method,
        http.target = %record.path,
        http.status_code = record.status_code,
        otel.status_code = field::Empty,
    );

    async move {
        let timer = state.metrics.db_query_duration.start_timer();
        match state.store.insert(&record).await {
            Ok(()) => {
                timer.observe_duration();
                state.metrics.rows_processed.inc();
            }
            Err(e) => {
                timer.stop_and_discard();
                tracing::Span::current().record("otel.status_code", "ERROR");
                tracing::error!(error = %e, path = %record.path, "Error storing metrics");
            }
        }
    }
    .instrument(span)
    .await
}

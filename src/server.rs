use axum::{middleware as axum_mw, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::metrics::exposition;
use crate::middleware::{http_metrics, persist};
use crate::AppState;

/// Builds the full Axum `Router` with all routes and middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Application endpoints ───────────────────────────────
        .route("/", get(handlers::home::home))
        .route("/metrics/db", get(handlers::db_metrics::db_metrics))
        .route("/health", get(handlers::health::health))
        // ── Prometheus scrape ───────────────────────────────────
        .route("/metrics", get(exposition::scrape))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            persist::persist_request,
        ))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            http_metrics::track_http_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
}

use std::sync::Arc;

pub mod config;
pub mod db;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;
pub mod telemetry;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Request-record store; Postgres in production.
    pub store: Arc<dyn db::RequestStore>,

    /// Process-wide metrics registry, scraped at `GET /metrics`.
    pub metrics: Arc<metrics::AppMetrics>,
}

impl AppState {
    pub fn new(store: Arc<dyn db::RequestStore>, metrics: Arc<metrics::AppMetrics>) -> Self {
        Self { store, metrics }
    }
}

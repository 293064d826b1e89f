use std::collections::HashMap;

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry, TextEncoder,
};

use crate::config::SERVICE_NAME;

// ─── Configuration ───────────────────────────────────────────────

/// Database query latency buckets (seconds).
const DB_QUERY_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0];

/// HTTP response latency buckets (seconds).
const HTTP_DURATION_BUCKETS: &[f64] = &[0.003, 0.03, 0.1, 0.3, 1.5, 10.0];

/// Labels on `http_request_duration_seconds`, in `with_label_values` order.
const HTTP_LABELS: &[&str] = &["status_code", "method", "path"];

// ─── Public types ────────────────────────────────────────────────

/// Every metric the service exports, registered on one private registry.
///
/// Built once at startup and shared through `AppState`. All handles are
/// internally synchronized, so handlers update them without extra locking.
pub struct AppMetrics {
    registry: Registry,

    /// Duration of database queries in seconds.
    pub db_query_duration: Histogram,

    /// Connection count last reported by `pg_stat_activity`.
    pub active_connections: IntGauge,

    /// Rows successfully written to `requests`.
    pub rows_processed: IntCounter,

    /// Per-request latency labelled by status code, method and path.
    pub http_request_duration: HistogramVec,

    /// 1 while the process is serving.
    pub up: IntGauge,
}

impl AppMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let const_labels = HashMap::from([("app".to_string(), SERVICE_NAME.to_string())]);
        let registry = Registry::new_custom(None, Some(const_labels))?;

        let db_query_duration = Histogram::with_opts(
            HistogramOpts::new(
                "db_query_duration_seconds",
                "Duration of database queries in seconds",
            )
            .buckets(DB_QUERY_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(db_query_duration.clone()))?;

        let active_connections = IntGauge::new(
            "postgres_active_connections",
            "Number of active database connections",
        )?;
        registry.register(Box::new(active_connections.clone()))?;

        let rows_processed =
            IntCounter::new("db_rows_processed_total", "Total number of rows processed")?;
        registry.register(Box::new(rows_processed.clone()))?;

        let http_request_duration = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "duration histogram of http responses labeled with: status_code, method, path",
            )
            .buckets(HTTP_DURATION_BUCKETS.to_vec()),
            HTTP_LABELS,
        )?;
        registry.register(Box::new(http_request_duration.clone()))?;

        let up = IntGauge::new("up", "1 = up, 0 = not up")?;
        registry.register(Box::new(up.clone()))?;
        up.set(1);

        Ok(Self {
            registry,
            db_query_duration,
            active_connections,
            rows_processed,
            http_request_duration,
            up,
        })
    }

    /// Record one served HTTP request.
    pub fn observe_http(&self, method: &str, path: &str, status: u16, seconds: f64) {
        let status = status.to_string();
        self.http_request_duration
            .with_label_values(&[status.as_str(), method, path])
            .observe(seconds);
    }

    /// Render the whole registry in the Prometheus text exposition format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

pub mod db_metrics;
pub mod health;
pub mod home;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

// ─── Unified error type ──────────────────────────────────────────

/// Handler failures. Each variant maps to a 500 with a fixed JSON shape; the
/// underlying error is logged, never echoed, except for the health check.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("home query failed: {0}")]
    Database(#[source] StoreError),

    #[error("database metrics query failed: {0}")]
    DbMetrics(#[source] StoreError),

    #[error("health check failed: {0}")]
    Unhealthy(#[source] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Body of `GET /health`, on success and on failure.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        match self {
            Self::Database(_) => (
                status,
                Json(ErrorBody {
                    error: "Database error",
                }),
            )
                .into_response(),
            Self::DbMetrics(_) => (
                status,
                Json(ErrorBody {
                    error: "Error fetching database metrics",
                }),
            )
                .into_response(),
            Self::Unhealthy(e) => (
                status,
                Json(HealthBody {
                    status: "unhealthy",
                    error: Some(e.to_string()),
                }),
            )
                .into_response(),
        }
    }
}

/// Mark the current span as failed and attach the error to it as an event.
pub(crate) fn record_span_error(err: &StoreError) {
    tracing::Span::current().record("otel.status_code", "ERROR");
    tracing::error!(error = %err, "database operation failed");
}

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{field, Instrument};

use crate::db::{RequestStatistics, StoreError};
use crate::AppState;

use super::{record_span_error, AppError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DbMetricsResponse {
    pub active_connections: i64,
    pub statistics: RequestStatistics,
}

// ─── GET /metrics/db ─────────────────────────────────────────────
/// Connection count as seen by Postgres plus latency aggregates over every
/// stored request. Also refreshes the `postgres_active_connections` gauge.

pub async fn db_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DbMetricsResponse>, AppError> {
    let span = tracing::info_span!("db-metrics", otel.status_code = field::Empty);

    async move {
        collect(&state).await.map(Json).map_err(|e| {
            record_span_error(&e);
            AppError::DbMetrics(e)
        })
    }
    .instrument(span)
    .await
}

async fn collect(state: &AppState) -> Result<DbMetricsResponse, StoreError> {
    let active_connections = state.store.active_connections().await?;
    state.metrics.active_connections.set(active_connections);

    let statistics = state.store.statistics().await?;

    Ok(DbMetricsResponse {
        active_connections,
        statistics,
    })
}

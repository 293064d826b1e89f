use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{field, Instrument};

use crate::AppState;

use super::{record_span_error, AppError};

const GREETING: &str = "Hello from monitoring demo!";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeResponse {
    pub message: &'static str,
    pub total_requests: i64,
    pub timestamp: DateTime<Utc>,
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn home(State(state): State<Arc<AppState>>) -> Result<Json<HomeResponse>, AppError> {
    let span = tracing::info_span!("home-request", otel.status_code = field::Empty);

    async move {
        let timer = state.metrics.db_query_duration.start_timer();
        let total_requests = match state.store.count().await {
            Ok(count) => {
                timer.observe_duration();
                count
            }
            Err(e) => {
                timer.stop_and_discard();
                record_span_error(&e);
                return Err(AppError::Database(e));
            }
        };

        Ok(Json(HomeResponse {
            message: GREETING,
            total_requests,
            timestamp: Utc::now(),
        }))
    }
    .instrument(span)
    .await
}

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::AppState;

use super::{AppError, HealthBody};

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthBody>, AppError> {
    match state.store.ping().await {
        Ok(()) => Ok(Json(HealthBody {
            status: "healthy",
            error: None,
        })),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            Err(AppError::Unhealthy(e))
        }
    }
}

//! Engine statistics endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use apimute_core::engine::EngineStatistics;

use crate::state::AppState;

/// `GET /api/stats` — aggregate registry and metrics statistics.
pub async fn statistics(State(state): State<Arc<AppState>>) -> Json<EngineStatistics> {
    Json(state.engine.statistics().await)
}

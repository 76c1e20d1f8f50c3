//! Test lifecycle endpoints: create, inspect, cancel, report, export,
//! cleanup.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use apimute_core::error::EngineError;
use apimute_core::model::{HttpMethod, TargetRequest, DEFAULT_TIMEOUT_MS};
use apimute_core::report::{self, Report};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of `POST /api/tests`.
#[derive(Debug, Deserialize)]
pub struct CreateTestRequest {
    /// Target endpoint URL.
    pub url: String,
    /// HTTP method name (GET, POST, PUT, DELETE, PATCH).
    pub method: String,
    /// Request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Optional JSON payload.
    #[serde(default)]
    pub payload: Option<Value>,
    /// Per-request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// `POST /api/tests` — validate, admit, and start a test.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateTestRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let method: HttpMethod = body.method.parse().map_err(ApiError::BadRequest)?;
    let config = TargetRequest {
        url: body.url,
        method,
        headers: body.headers,
        payload: body.payload,
        timeout_ms: body.timeout,
    };

    let test_id = state.engine.start(config).await?;
    Ok((StatusCode::ACCEPTED, Json(json!({ "test_id": test_id }))))
}

/// `GET /api/tests` — status views of all non-terminal tests.
pub async fn list_active(State(state): State<Arc<AppState>>) -> Json<Value> {
    let active = state.engine.active_tests().await;
    Json(json!({ "active_tests": active }))
}

/// `GET /api/tests/{id}` — full execution snapshot (config, status,
/// results).
pub async fn get_execution(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let execution = state.engine.execution(&id).await?;
    Ok(Json(serde_json::to_value(&execution).map_err(|e| {
        ApiError::Internal(e.to_string())
    })?))
}

/// `GET /api/tests/{id}/status` — status snapshot.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let view = state.engine.status(&id).await?;
    Ok(Json(json!(view)))
}

/// `GET /api/tests/{id}/results` — mutation results recorded so far.
pub async fn get_results(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let results = state.engine.results(&id).await?;
    Ok(Json(json!({ "results": results })))
}

/// `POST /api/tests/{id}/cancel` — cooperatively cancel a running test.
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.engine.cancel(&id).await?;
    Ok(Json(json!({ "status": "cancelled" })))
}

/// `POST /api/tests/{id}/pause` — part of the contract, not implemented.
pub async fn pause(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.engine.pause(&id)?;
    Ok(Json(json!({ "status": "paused" })))
}

/// `POST /api/tests/{id}/resume` — part of the contract, not implemented.
pub async fn resume(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.engine.resume(&id)?;
    Ok(Json(json!({ "status": "resumed" })))
}

/// `GET /api/tests/{id}/report` — the aggregated report of a completed
/// test.
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Report>, ApiError> {
    Ok(Json(report_for(&state, &id).await?))
}

/// Query of the export endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    /// When true, export the summary-only variant.
    #[serde(default)]
    pub summary: bool,
}

/// `GET /api/tests/{id}/export` — downloadable JSON export with a derived
/// filename.
pub async fn export(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, ApiError> {
    let report = report_for(&state, &id).await?;
    let bytes = if query.summary {
        report::export_summary_to_json(&report)
    } else {
        report::export_to_json(&report)
    }
    .map_err(|e| ApiError::Internal(e.to_string()))?;
    let name = report::filename(&report);

    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{name}\""),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// `DELETE /api/tests/{id}` — remove a test regardless of state.
pub async fn force_cleanup(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.engine.force_cleanup(&id).await?;
    Ok(Json(json!({ "status": "removed" })))
}

/// Query of the cleanup endpoint.
#[derive(Debug, Deserialize)]
pub struct CleanupQuery {
    /// Remove terminal tests older than this many milliseconds.
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,
}

fn default_max_age_ms() -> u64 {
    3_600_000
}

/// `POST /api/tests/cleanup` — age-based cleanup of terminal tests.
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CleanupQuery>,
) -> Json<Value> {
    let removed = state.engine.cleanup_completed(query.max_age_ms).await;
    Json(json!({ "removed": removed }))
}

/// Fetch the report, mapping the not-ready state conflict to a 400 per the
/// query contract.
async fn report_for(state: &AppState, id: &str) -> Result<Report, ApiError> {
    state.engine.report(id).await.map_err(|err| match err {
        EngineError::Conflict { message } => ApiError::BadRequest(message),
        other => other.into(),
    })
}

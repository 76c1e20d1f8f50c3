//! Health endpoint.

use axum::Json;
use serde_json::{json, Value};

/// `GET /api/health` — liveness probe with the core library version.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": apimute_core::version(),
    }))
}

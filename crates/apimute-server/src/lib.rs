//! apimute HTTP API server.
//!
//! Exposes the core test engine as a REST API: test intake, status and
//! result polling, cancellation, report retrieval, and export download.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete axum router with all API routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(routes::health::health))
        // Tests
        .route(
            "/tests",
            get(routes::tests::list_active).post(routes::tests::create),
        )
        .route("/tests/cleanup", post(routes::tests::cleanup))
        .route(
            "/tests/{id}",
            get(routes::tests::get_execution).delete(routes::tests::force_cleanup),
        )
        .route("/tests/{id}/status", get(routes::tests::get_status))
        .route("/tests/{id}/results", get(routes::tests::get_results))
        .route("/tests/{id}/cancel", post(routes::tests::cancel))
        .route("/tests/{id}/pause", post(routes::tests::pause))
        .route("/tests/{id}/resume", post(routes::tests::resume))
        .route("/tests/{id}/report", get(routes::tests::get_report))
        .route("/tests/{id}/export", get(routes::tests::export))
        // Statistics
        .route("/stats", get(routes::stats::statistics));

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

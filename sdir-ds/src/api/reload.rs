//! Reload and status endpoints

use axum::{extract::State, Json};
use tracing::info;

use crate::engine::{EngineStatus, LoadReport};
use crate::AppState;

/// POST /api/reload
///
/// Re-fetch the member list now. Always succeeds; a failed fetch reports
/// `"source": "fallback"`.
pub async fn reload_members(State(state): State<AppState>) -> Json<LoadReport> {
    let report = state.engine.reload().await;
    info!(count = report.count, source = ?report.source, "Reload via API");
    Json(report)
}

/// GET /api/status
pub async fn engine_status(State(state): State<AppState>) -> Json<EngineStatus> {
    Json(state.engine.status())
}

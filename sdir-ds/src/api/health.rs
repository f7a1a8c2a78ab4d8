//! Liveness endpoint

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::engine::LoadState;
use crate::AppState;

/// `/health` reply; `state` is the member list load state, not a readiness gate
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub module: &'static str,
    pub version: &'static str,
    pub store: &'static str,
    pub state: LoadState,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = state.engine.status();
    Json(HealthResponse {
        status: "ok",
        module: "sdir-ds",
        version: env!("CARGO_PKG_VERSION"),
        store: status.store,
        state: status.state,
    })
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

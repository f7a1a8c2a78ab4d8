//! sdir-ds library - Directory Service
//!
//! Member search with 30-per-page pagination over a spreadsheet-backed roster,
//! plus validated submission of new members.

use axum::Router;
use sdir_common::events::EventBus;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod engine;
pub mod error;
pub mod pagination;
pub mod store;
pub mod submission;

use engine::SearchEngine;
use store::DirectoryStore;
use submission::SubmissionPipeline;

/// Events buffered per slow SSE client
pub const EVENT_BUS_CAPACITY: usize = 64;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
    pub pipeline: Arc<SubmissionPipeline>,
    pub event_bus: EventBus,
}

impl AppState {
    /// Create new application state around one store and one event bus
    pub fn new(store: Arc<dyn DirectoryStore>, event_bus: EventBus) -> Self {
        Self {
            engine: Arc::new(SearchEngine::new(Arc::clone(&store), event_bus.clone())),
            pipeline: Arc::new(SubmissionPipeline::new(store, event_bus.clone())),
            event_bus,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};

    Router::new()
        .route(
            "/api/members",
            get(api::search_members).post(api::submit_member),
        )
        .route("/api/members/validate", post(api::validate_member_field))
        .route("/api/reload", post(api::reload_members))
        .route("/api/status", get(api::engine_status))
        .route("/api/events", get(api::event_stream))
        .route("/api/buildinfo", get(api::get_build_info))
        .merge(api::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        // Front-end may be served from another origin
        .layer(CorsLayer::permissive())
}

//! Server-Sent Events (SSE) for directory events

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /api/events - SSE event stream
///
/// Streams events:
/// - ConnectionStatus (on connect)
/// - MemberAdded, RecordsReloaded
/// - heartbeat comments
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    sdir_common::sse::create_event_sse_stream("sdir-ds", &state.event_bus)
}

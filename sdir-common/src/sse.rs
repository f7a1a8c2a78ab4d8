//! Server-Sent Events (SSE) utilities

use crate::events::EventBus;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Stream every [`DirectoryEvent`](crate::events::DirectoryEvent) on the bus to an SSE client
///
/// Sends a `ConnectionStatus` event first, then one SSE event per directory
/// event (event name = variant name, data = JSON), with a heartbeat comment
/// every 15 seconds.
pub fn create_event_sse_stream(
    service_name: &'static str,
    event_bus: &EventBus,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected to {} events", service_name);

    let mut rx = event_bus.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default()
            .event("ConnectionStatus")
            .data("connected"));

        loop {
            let next = tokio::select! {
                received = rx.recv() => Some(received),
                _ = tokio::time::sleep(HEARTBEAT_INTERVAL) => None,
            };

            match next {
                Some(Ok(event)) => {
                    let name = event.event_type();
                    match serde_json::to_string(&event) {
                        Ok(json) => yield Ok(Event::default().event(name).data(json)),
                        Err(e) => warn!("SSE: failed to serialize {} event: {}", name, e),
                    }
                }
                Some(Err(RecvError::Lagged(skipped))) => {
                    warn!("SSE: client lagged, {} events skipped", skipped);
                }
                Some(Err(RecvError::Closed)) => {
                    info!("SSE: {} event bus closed", service_name);
                    break;
                }
                None => {
                    debug!("SSE: Sending heartbeat");
                    yield Ok(Event::default().comment("heartbeat"));
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(HEARTBEAT_INTERVAL)
            .text("heartbeat"),
    )
}

//! Directory events and the in-process event bus
//!
//! The submission pipeline announces new members here; the search engine
//! listens and schedules a reload. SSE clients receive the same events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Where the canonical record list came from on the last load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSource {
    /// Rows fetched from the directory store
    Store,
    /// Built-in sample records used because the store could not be reached
    Fallback,
}

/// Directory event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DirectoryEvent {
    /// A new member was appended to the directory store
    MemberAdded {
        name: String,
        village: String,
        timestamp: DateTime<Utc>,
    },

    /// The canonical record list was replaced
    RecordsReloaded {
        count: usize,
        source: RecordSource,
        timestamp: DateTime<Utc>,
    },
}

impl DirectoryEvent {
    /// SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::MemberAdded { .. } => "MemberAdded",
            DirectoryEvent::RecordsReloaded { .. } => "RecordsReloaded",
        }
    }
}

/// Broadcast bus for [`DirectoryEvent`]s
///
/// Cloning is cheap; all clones share one channel. Events sent while nobody is
/// subscribed are dropped.
///
/// # Examples
///
/// ```
/// use sdir_common::events::{DirectoryEvent, EventBus};
///
/// let bus = EventBus::new(16);
/// let mut rx = bus.subscribe();
///
/// bus.emit_lossy(DirectoryEvent::MemberAdded {
///     name: "Rajesh Patel".to_string(),
///     village: "Gandhinagar".to_string(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(DirectoryEvent::MemberAdded { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DirectoryEvent>,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per slow subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` if no subscriber is listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: DirectoryEvent,
    ) -> Result<usize, broadcast::error::SendError<DirectoryEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where nobody is listening
    pub fn emit_lossy(&self, event: DirectoryEvent) {
        let _ = self.tx.send(event);
    }
}

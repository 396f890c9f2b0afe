//! Event lifecycle collaborator: tells the timer authority whether an event is live and how many
//! rounds it runs.

use dashmap::DashMap;
use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle status owned by the event management system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Registration open, not started.
    Upcoming,
    /// Running.
    InProgress,
    /// Temporarily halted by organizers.
    Paused,
    /// Finished.
    Completed,
    /// Called off.
    Cancelled,
}

impl EventStatus {
    /// Whether timer control actions are accepted for an event in this status.
    pub fn is_live_eligible(self) -> bool {
        matches!(self, EventStatus::InProgress | EventStatus::Paused)
    }
}

/// Lifecycle facts the timer needs about one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventLifecycle {
    /// Current lifecycle status.
    pub status: EventStatus,
    /// Number of rounds the event runs.
    pub final_round: u32,
}

/// Read/write access to event lifecycle data.
pub trait EventDirectory: Send + Sync {
    /// Look up an event, `None` when it is unknown.
    fn lifecycle(&self, event_id: Uuid) -> BoxFuture<'static, Option<EventLifecycle>>;
    /// Register or update an event.
    fn upsert(&self, event_id: Uuid, lifecycle: EventLifecycle) -> BoxFuture<'static, ()>;
}

/// Process-local [`EventDirectory`].
#[derive(Debug, Default)]
pub struct MemoryEventDirectory {
    events: DashMap<Uuid, EventLifecycle>,
}

impl MemoryEventDirectory {
    /// Build a directory pre-populated with `events`.
    pub fn with_events(events: impl IntoIterator<Item = (Uuid, EventLifecycle)>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl EventDirectory for MemoryEventDirectory {
    fn lifecycle(&self, event_id: Uuid) -> BoxFuture<'static, Option<EventLifecycle>> {
        let found = self.events.get(&event_id).map(|entry| *entry.value());
        Box::pin(future::ready(found))
    }

    fn upsert(&self, event_id: Uuid, lifecycle: EventLifecycle) -> BoxFuture<'static, ()> {
        self.events.insert(event_id, lifecycle);
        Box::pin(future::ready(()))
    }
}

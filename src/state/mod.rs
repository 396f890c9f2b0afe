//! Shared application state.

pub mod clock;
pub mod events;
mod sse;
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    services::credentials::{CredentialResolver, StaticCredentials},
};

pub use self::sse::TimerHub;
use self::{
    clock::{Clock, SystemClock},
    events::{EventDirectory, MemoryEventDirectory},
    timer::TimerRecord,
};

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Capacity of each per-event broadcast channel.
const TIMER_STREAM_CAPACITY: usize = 16;

/// Single writer for one event's timer: the record behind a mutex that serializes control calls,
/// plus the hub used to push changes to subscribers.
pub struct TimerAuthority {
    record: Mutex<TimerRecord>,
    hub: TimerHub,
}

impl TimerAuthority {
    fn new(record: TimerRecord) -> Self {
        Self {
            record: Mutex::new(record),
            hub: TimerHub::new(TIMER_STREAM_CAPACITY),
        }
    }

    /// Exclusive access to the record. Hold the guard for the whole read-check-write sequence.
    pub async fn lock(&self) -> MutexGuard<'_, TimerRecord> {
        self.record.lock().await
    }

    /// Broadcast hub for this event's stream.
    pub fn hub(&self) -> &TimerHub {
        &self.hub
    }
}

/// Central application state: collaborators plus one [`TimerAuthority`] per observed event.
pub struct AppState {
    config: AppConfig,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventDirectory>,
    credentials: Arc<dyn CredentialResolver>,
    timers: DashMap<Uuid, Arc<TimerAuthority>>,
}

impl AppState {
    /// Build the state from configuration, using the system clock and in-memory collaborators
    /// seeded from the config file.
    pub fn new(config: AppConfig) -> SharedState {
        let events = MemoryEventDirectory::with_events(config.seeded_events());
        let credentials = StaticCredentials::new(config.credentials().iter().cloned());
        Self::with_collaborators(
            config,
            Arc::new(SystemClock),
            Arc::new(events),
            Arc::new(credentials),
        )
    }

    /// Build the state around explicit collaborators.
    pub fn with_collaborators(
        config: AppConfig,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventDirectory>,
        credentials: Arc<dyn CredentialResolver>,
    ) -> SharedState {
        Arc::new(Self {
            config,
            clock,
            events,
            credentials,
            timers: DashMap::new(),
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current wall-clock time as seen by the authority.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Event lifecycle collaborator.
    pub fn events(&self) -> &dyn EventDirectory {
        self.events.as_ref()
    }

    /// Credential collaborator.
    pub fn credentials(&self) -> &dyn CredentialResolver {
        self.credentials.as_ref()
    }

    /// Authority of an event that already has a timer record.
    pub fn existing_authority(&self, event_id: Uuid) -> Option<Arc<TimerAuthority>> {
        self.timers.get(&event_id).map(|entry| entry.value().clone())
    }

    /// Authority for `event_id`, creating an inactive record when the event is known to the
    /// lifecycle collaborator but has no timer yet. `None` for unknown events.
    pub async fn authority(&self, event_id: Uuid) -> Option<Arc<TimerAuthority>> {
        if let Some(existing) = self.existing_authority(event_id) {
            return Some(existing);
        }

        let lifecycle = self.events.lifecycle(event_id).await?;
        let authority = self
            .timers
            .entry(event_id)
            .or_insert_with(|| {
                debug!(%event_id, final_round = lifecycle.final_round, "creating timer record");
                Arc::new(TimerAuthority::new(TimerRecord::new(
                    event_id,
                    lifecycle.final_round,
                    self.config.default_round_duration(),
                    self.config.default_break_duration(),
                )))
            })
            .clone();
        Some(authority)
    }

    /// Every timer record currently held, for background sweeps.
    pub fn authorities(&self) -> Vec<(Uuid, Arc<TimerAuthority>)> {
        self.timers
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect()
    }
}

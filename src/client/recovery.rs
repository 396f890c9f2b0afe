//! Best-effort persistence of the last displayed view, keyed by event and client.
//!
//! A recovered view is shown until the first poll completes; it never starts a countdown.

use std::{
    fs,
    path::{Path, PathBuf},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;
use uuid::Uuid;

use crate::state::timer::TimerStatus;

use super::machine::ClientTimerView;

/// Last view a client displayed before it went away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveredView {
    /// Event the view belongs to.
    pub event_id: Uuid,
    /// Displayed status.
    pub status: TimerStatus,
    /// Displayed round.
    pub current_round: u32,
    /// Number of rounds in the event.
    pub final_round: u32,
    /// Round length in seconds.
    pub round_duration: u32,
    /// Break length in seconds.
    pub break_duration: u32,
    /// Countdown shown when the view was saved.
    pub seconds_remaining: u32,
    /// When the view was saved.
    #[serde(with = "time::serde::rfc3339")]
    pub saved_at: OffsetDateTime,
}

impl RecoveredView {
    /// Record `view` as displayed at `saved_at`.
    pub fn capture(view: &ClientTimerView, saved_at: OffsetDateTime) -> Self {
        Self {
            event_id: view.event_id,
            status: view.status,
            current_round: view.current_round,
            final_round: view.final_round,
            round_duration: view.round_duration,
            break_duration: view.break_duration,
            seconds_remaining: view.seconds_remaining,
            saved_at,
        }
    }
}

/// Local store for recovered views. Failures are swallowed: recovery is advisory.
pub trait RecoveryStore: Send + Sync {
    fn load(&self, event_id: Uuid, client_id: Uuid) -> Option<RecoveredView>;
    fn save(&self, client_id: Uuid, view: &RecoveredView);
    fn clear(&self, event_id: Uuid, client_id: Uuid);
}

/// Process-local store, useful for tests and short-lived clients.
#[derive(Debug, Default)]
pub struct MemoryRecoveryStore {
    views: DashMap<(Uuid, Uuid), RecoveredView>,
}

impl MemoryRecoveryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecoveryStore for MemoryRecoveryStore {
    fn load(&self, event_id: Uuid, client_id: Uuid) -> Option<RecoveredView> {
        self.views
            .get(&(event_id, client_id))
            .map(|entry| entry.value().clone())
    }

    fn save(&self, client_id: Uuid, view: &RecoveredView) {
        self.views.insert((view.event_id, client_id), view.clone());
    }

    fn clear(&self, event_id: Uuid, client_id: Uuid) {
        self.views.remove(&(event_id, client_id));
    }
}

/// One JSON file per (event, client) pair under a directory.
#[derive(Debug, Clone)]
pub struct FileRecoveryStore {
    dir: PathBuf,
}

impl FileRecoveryStore {
    /// Store views as JSON files under `dir`. The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, event_id: Uuid, client_id: Uuid) -> PathBuf {
        self.dir.join(format!("{event_id}-{client_id}.json"))
    }
}

impl RecoveryStore for FileRecoveryStore {
    fn load(&self, event_id: Uuid, client_id: Uuid) -> Option<RecoveredView> {
        let path = self.path_for(event_id, client_id);
        let raw = fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(view) => Some(view),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Discarding unreadable recovery file");
                None
            }
        }
    }

    fn save(&self, client_id: Uuid, view: &RecoveredView) {
        let path = self.path_for(view.event_id, client_id);
        if let Err(err) = write_json(&self.dir, &path, view) {
            warn!(path = %path.display(), error = %err, "Failed to persist recovery view");
        }
    }

    fn clear(&self, event_id: Uuid, client_id: Uuid) {
        let _ = fs::remove_file(self.path_for(event_id, client_id));
    }
}

fn write_json(dir: &Path, path: &Path, view: &RecoveredView) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    let body = serde_json::to_vec(view).map_err(std::io::Error::other)?;
    fs::write(path, body)
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    fn sample(event_id: Uuid) -> RecoveredView {
        RecoveredView {
            event_id,
            status: TimerStatus::Paused,
            current_round: 2,
            final_round: 4,
            round_duration: 180,
            break_duration: 60,
            seconds_remaining: 42,
            saved_at: datetime!(2026-03-01 18:00:00 UTC),
        }
    }

    #[test]
    fn memory_store_is_keyed_by_event_and_client() {
        let store = MemoryRecoveryStore::new();
        let event_id = Uuid::new_v4();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());

        store.save(alice, &sample(event_id));
        assert_eq!(store.load(event_id, alice), Some(sample(event_id)));
        assert_eq!(store.load(event_id, bob), None);

        store.clear(event_id, alice);
        assert_eq!(store.load(event_id, alice), None);
    }

    #[test]
    fn file_store_survives_a_new_instance() {
        let dir = std::env::temp_dir().join(format!("round-timer-recovery-{}", Uuid::new_v4()));
        let event_id = Uuid::new_v4();
        let client_id = Uuid::new_v4();

        FileRecoveryStore::new(&dir).save(client_id, &sample(event_id));
        let reopened = FileRecoveryStore::new(&dir);
        assert_eq!(reopened.load(event_id, client_id), Some(sample(event_id)));

        reopened.clear(event_id, client_id);
        assert_eq!(reopened.load(event_id, client_id), None);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn corrupt_file_is_ignored() {
        let dir = std::env::temp_dir().join(format!("round-timer-recovery-{}", Uuid::new_v4()));
        let store = FileRecoveryStore::new(&dir);
        let (event_id, client_id) = (Uuid::new_v4(), Uuid::new_v4());
        fs::create_dir_all(&dir).unwrap();
        fs::write(store.path_for(event_id, client_id), b"{not json").unwrap();

        assert_eq!(store.load(event_id, client_id), None);
        let _ = fs::remove_dir_all(dir);
    }
}

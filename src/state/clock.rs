//! Round clock arithmetic and the wall-clock seam used by the authority and clients.

use std::sync::{Arc, Mutex};

use time::{Duration, OffsetDateTime};

/// Seconds left in a round that started at `round_start_time` and lasts `round_duration` seconds.
///
/// Elapsed time is floored to whole seconds and the result never goes below zero. A start time in
/// the future (client clock behind the authority) counts as zero elapsed seconds.
pub fn remaining(now: OffsetDateTime, round_start_time: OffsetDateTime, round_duration: u32) -> u32 {
    let elapsed = (now - round_start_time).whole_seconds().max(0);
    let left = i64::from(round_duration) - elapsed;
    u32::try_from(left.max(0)).unwrap_or(0)
}

/// Start timestamp that makes [`remaining`] report exactly `time_remaining` at `now`.
pub fn start_for_remaining(
    now: OffsetDateTime,
    round_duration: u32,
    time_remaining: u32,
) -> OffsetDateTime {
    let elapsed = round_duration.saturating_sub(time_remaining);
    now - Duration::seconds(i64::from(elapsed))
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current UTC timestamp.
    fn now(&self) -> OffsetDateTime;
}

/// [`Clock`] backed by the operating system.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Manually driven [`Clock`], useful for simulations and tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<OffsetDateTime>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    pub fn new(start: OffsetDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward by `seconds`.
    pub fn advance(&self, seconds: i64) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard += Duration::seconds(seconds);
    }

    /// Jump to an absolute timestamp.
    pub fn set(&self, now: OffsetDateTime) {
        let mut guard = self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> OffsetDateTime {
        *self.now.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

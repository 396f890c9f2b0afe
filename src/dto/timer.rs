//! DTO definitions for the timer read/control API and its event stream.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::state::timer::{TimerPhase, TimerRecord, TimerStatus};

/// Immutable read of an event's timer at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimerSnapshot {
    /// Event the timer belongs to.
    pub event_id: Uuid,
    /// Status at read time, after lazy expiry.
    pub status: TimerStatus,
    /// Zero until the first round starts.
    pub current_round: u32,
    pub final_round: u32,
    /// Round length in seconds.
    pub round_duration: u32,
    /// Informational break length in seconds.
    pub break_duration: u32,
    /// RFC 3339 start of the running round, present only while active.
    #[serde(default, with = "time::serde::rfc3339::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub round_start_time: Option<OffsetDateTime>,
    /// Seconds left when the round was paused, present only while paused.
    #[serde(default)]
    pub pause_time_remaining: Option<u32>,
    /// Remaining seconds as computed by the server when the snapshot was taken.
    pub seconds_remaining: u32,
    /// Identity of the authoritative record; versions are only comparable within one epoch.
    pub epoch: Uuid,
    /// Incremented on every applied transition; lets clients drop out-of-order responses.
    pub version: u64,
}

impl TimerSnapshot {
    /// Capture `record` as seen at `now`.
    pub fn capture(record: &TimerRecord, now: OffsetDateTime) -> Self {
        let (round_start_time, pause_time_remaining) = match record.phase() {
            TimerPhase::Active { round_start_time } => (Some(round_start_time), None),
            TimerPhase::Paused { time_remaining } => (None, Some(time_remaining)),
            _ => (None, None),
        };

        Self {
            event_id: record.event_id(),
            status: record.status(),
            current_round: record.current_round(),
            final_round: record.final_round(),
            round_duration: record.round_duration(),
            break_duration: record.break_duration(),
            round_start_time,
            pause_time_remaining,
            seconds_remaining: record.seconds_remaining(now),
            epoch: record.epoch(),
            version: record.version(),
        }
    }
}

/// Body of a pause request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PauseRequest {
    /// Remaining seconds displayed by the caller. Informational; the server derives the preserved
    /// value from its own clock.
    #[serde(default)]
    pub time_remaining: Option<u32>,
}

/// Body of a duration update. At least one field must be present.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_duration_update"))]
pub struct UpdateDurationRequest {
    /// New round length in seconds.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub round_duration: Option<u32>,
    /// New break length in seconds.
    #[serde(default)]
    pub break_duration: Option<u32>,
}

fn validate_duration_update(request: &UpdateDurationRequest) -> Result<(), ValidationError> {
    if request.round_duration.is_none() && request.break_duration.is_none() {
        let mut err = ValidationError::new("duration_update_empty");
        err.message = Some("either round_duration or break_duration must be provided".into());
        return Err(err);
    }
    Ok(())
}

/// Fire-once signal published when a round finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RoundEndedEvent {
    /// Event whose round finished.
    pub event_id: Uuid,
    /// Round that just finished.
    pub round: u32,
}

/// Error payload returned when a request is refused.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub message: String,
    /// Unchanged timer state, included when a control action was rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::state::timer::TimerCommand;

    #[test]
    fn capture_exposes_timing_only_for_its_status() {
        let now = datetime!(2026-03-01 18:00:00 UTC);
        let mut record = TimerRecord::new(Uuid::new_v4(), 2, 180, 60);

        let inactive = TimerSnapshot::capture(&record, now);
        assert_eq!(inactive.round_start_time, None);
        assert_eq!(inactive.pause_time_remaining, None);

        record.apply(TimerCommand::Start, now).unwrap();
        let active = TimerSnapshot::capture(&record, now);
        assert_eq!(active.round_start_time, Some(now));
        assert_eq!(active.pause_time_remaining, None);
        assert_eq!(active.seconds_remaining, 180);

        record.apply(TimerCommand::Pause, now).unwrap();
        let paused = TimerSnapshot::capture(&record, now);
        assert_eq!(paused.round_start_time, None);
        assert_eq!(paused.pause_time_remaining, Some(180));
    }

    #[test]
    fn snapshot_json_uses_snake_case_status_and_rfc3339() {
        let now = datetime!(2026-03-01 18:00:00 UTC);
        let mut record = TimerRecord::new(Uuid::nil(), 2, 180, 60);
        record.apply(TimerCommand::Start, now).unwrap();
        let json = serde_json::to_value(TimerSnapshot::capture(&record, now)).unwrap();

        assert_eq!(json["status"], "active");
        assert_eq!(json["round_start_time"], "2026-03-01T18:00:00Z");
        assert!(json["pause_time_remaining"].is_null());
    }

    #[test]
    fn empty_duration_update_is_invalid() {
        assert!(UpdateDurationRequest::default().validate().is_err());
        assert!(
            UpdateDurationRequest {
                round_duration: Some(0),
                break_duration: None,
            }
            .validate()
            .is_err()
        );
        assert!(
            UpdateDurationRequest {
                round_duration: None,
                break_duration: Some(0),
            }
            .validate()
            .is_ok()
        );
    }
}

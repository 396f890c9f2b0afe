//! Payloads pushed on `/events/{event_id}/timer/stream`.

use serde::Serialize;

use crate::dto::timer::{RoundEndedEvent, TimerSnapshot};

/// SSE event name carrying a full [`TimerSnapshot`].
pub const EVENT_TIMER_UPDATED: &str = "timer.updated";
/// SSE event name carrying a [`RoundEndedEvent`].
pub const EVENT_ROUND_ENDED: &str = "round.ended";

/// Typed item travelling through an event's broadcast channel. Serialized only at the SSE edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerStreamEvent {
    /// Latest authoritative snapshot.
    Updated(TimerSnapshot),
    /// A round finished.
    RoundEnded(RoundEndedEvent),
}

impl TimerStreamEvent {
    /// SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            TimerStreamEvent::Updated(_) => EVENT_TIMER_UPDATED,
            TimerStreamEvent::RoundEnded(_) => EVENT_ROUND_ENDED,
        }
    }

    /// SSE `data:` field.
    pub fn data(&self) -> serde_json::Result<String> {
        match self {
            TimerStreamEvent::Updated(snapshot) => to_json(snapshot),
            TimerStreamEvent::RoundEnded(signal) => to_json(signal),
        }
    }
}

fn to_json(payload: &impl Serialize) -> serde_json::Result<String> {
    serde_json::to_string(payload)
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn round_ended_event_is_named_and_encoded() {
        let event_id = Uuid::nil();
        let event = TimerStreamEvent::RoundEnded(RoundEndedEvent { event_id, round: 2 });

        assert_eq!(event.name(), "round.ended");
        let data: serde_json::Value = serde_json::from_str(&event.data().unwrap()).unwrap();
        assert_eq!(data["round"], 2);
        assert_eq!(data["event_id"], event_id.to_string());
    }
}

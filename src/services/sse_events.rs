use tracing::trace;
use uuid::Uuid;

use crate::{
    dto::{
        sse::TimerStreamEvent,
        timer::{RoundEndedEvent, TimerSnapshot},
    },
    state::TimerAuthority,
};

/// Push the latest timer snapshot to the event's subscribers.
pub fn broadcast_timer_updated(authority: &TimerAuthority, snapshot: &TimerSnapshot) {
    let delivered = authority
        .hub()
        .publish(TimerStreamEvent::Updated(snapshot.clone()));
    trace!(event_id = %snapshot.event_id, version = snapshot.version, delivered, "timer update pushed");
}

/// Push the fire-once end-of-round signal.
pub fn broadcast_round_ended(authority: &TimerAuthority, event_id: Uuid, round: u32) {
    let delivered = authority
        .hub()
        .publish(TimerStreamEvent::RoundEnded(RoundEndedEvent { event_id, round }));
    trace!(%event_id, round, delivered, "round end pushed");
}

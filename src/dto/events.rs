//! DTO definitions for the event lifecycle hand-off.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::timer::TimerSnapshot, state::events::EventStatus};

/// Lifecycle update pushed by the event management system.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, Validate)]
pub struct LifecycleRequest {
    /// New lifecycle status.
    pub status: EventStatus,
    /// Number of rounds; only applied to the timer before its first round starts.
    #[validate(range(min = 1))]
    pub final_round: u32,
    /// Optional round length for a timer that has not started yet.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub round_duration: Option<u32>,
    /// Optional break length for a timer that has not started yet.
    #[serde(default)]
    pub break_duration: Option<u32>,
}

/// Event lifecycle as recorded, with the resulting timer state.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LifecycleResponse {
    /// Updated event.
    pub event_id: Uuid,
    /// Recorded lifecycle status.
    pub status: EventStatus,
    /// Recorded number of rounds.
    pub final_round: u32,
    /// Timer after the update.
    pub timer: TimerSnapshot,
}

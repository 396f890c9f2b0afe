use crate::{dto::health::HealthResponse, state::SharedState};

/// Report liveness together with in-memory timer and stream counts.
pub fn health_status(state: &SharedState) -> HealthResponse {
    let authorities = state.authorities();
    HealthResponse {
        status: "ok",
        timers: authorities.len(),
        stream_subscribers: authorities
            .iter()
            .map(|(_, authority)| authority.hub().subscriber_count())
            .sum(),
    }
}

//! Health check payload.

use serde::Serialize;
use utoipa::ToSchema;

/// Liveness payload of `/healthcheck`.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Always "ok" while the process serves requests.
    pub status: &'static str,
    /// Event timers currently held in memory.
    pub timers: usize,
    /// Open timer stream connections across all events.
    pub stream_subscribers: usize,
}

//! Timer server-sent events route.

use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    middleware,
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;
use uuid::Uuid;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/events/{event_id}/timer/stream",
    tag = "sse",
    params(
        ("Authorization" = String, Header, description = "Bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses((status = 200, description = "Timer SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream `timer.updated` snapshots and `round.ended` signals for one event.
pub async fn timer_stream(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    let (initial, receiver) = sse_service::subscribe_timer(&state, event_id).await?;
    info!(%event_id, "new timer SSE connection");
    Ok(sse_service::to_sse_stream(event_id, initial, receiver))
}

/// Configure the SSE endpoints.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/events/{event_id}/timer/stream", get(timer_stream))
        .route_layer(middleware::from_fn_with_state(
            state,
            super::require_credential,
        ))
}

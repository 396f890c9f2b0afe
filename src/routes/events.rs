//! Event lifecycle hand-off route.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::put,
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::events::{LifecycleRequest, LifecycleResponse},
    error::AppError,
    services::{credentials::Credential, timer_service},
    state::SharedState,
};

/// Entry point for the event management system to hand over lifecycle changes.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/{event_id}/lifecycle", put(update_lifecycle))
        .route_layer(middleware::from_fn_with_state(
            state,
            super::require_credential,
        ))
}

/// Register or update an event's lifecycle status and round count.
#[utoipa::path(
    put,
    path = "/events/{event_id}/lifecycle",
    tag = "events",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    request_body = LifecycleRequest,
    responses((status = 200, description = "Lifecycle recorded", body = LifecycleResponse))
)]
pub async fn update_lifecycle(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
    Valid(Json(payload)): Valid<Json<LifecycleRequest>>,
) -> Result<Json<LifecycleResponse>, AppError> {
    let response = timer_service::update_lifecycle(&state, event_id, &credential, payload).await?;
    Ok(Json(response))
}

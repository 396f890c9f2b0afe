//! Timer read and control routes.

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    middleware,
    routing::{get, post, put},
};
use axum_valid::Valid;
use uuid::Uuid;

use crate::{
    dto::timer::{PauseRequest, TimerSnapshot, UpdateDurationRequest},
    error::AppError,
    services::{credentials::Credential, timer_service},
    state::{SharedState, timer::TimerCommand},
};

/// Timer read and control endpoints. Every route requires a bearer credential; control routes
/// additionally require the admin flag.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/events/{event_id}/timer", get(get_timer))
        .route("/events/{event_id}/timer/start", post(start_timer))
        .route("/events/{event_id}/timer/pause", post(pause_timer))
        .route("/events/{event_id}/timer/resume", post(resume_timer))
        .route("/events/{event_id}/timer/end-round", post(end_round))
        .route("/events/{event_id}/timer/next-round", post(next_round))
        .route("/events/{event_id}/timer/duration", put(update_duration))
        .route_layer(middleware::from_fn_with_state(
            state,
            super::require_credential,
        ))
}

/// Read the authoritative timer, ending an overdue round first.
#[utoipa::path(
    get,
    path = "/events/{event_id}/timer",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses(
        (status = 200, description = "Current timer", body = TimerSnapshot),
        (status = 404, description = "Unknown event")
    )
)]
pub async fn get_timer(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<TimerSnapshot>, AppError> {
    Ok(Json(timer_service::fetch_timer(&state, event_id).await?))
}

/// Start round one.
#[utoipa::path(
    post,
    path = "/events/{event_id}/timer/start",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses(
        (status = 200, description = "Round one running", body = TimerSnapshot),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn start_timer(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let snapshot =
        timer_service::control_timer(&state, event_id, &credential, TimerCommand::Start).await?;
    Ok(Json(snapshot))
}

/// Freeze the running round. The body is optional.
#[utoipa::path(
    post,
    path = "/events/{event_id}/timer/pause",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    request_body(content = PauseRequest, description = "Optional; remaining seconds shown by the caller"),
    responses(
        (status = 200, description = "Round paused", body = TimerSnapshot),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn pause_timer(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
    payload: Option<Json<PauseRequest>>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let payload = payload.map(|Json(body)| body).unwrap_or_default();
    let snapshot = timer_service::pause_timer(&state, event_id, &credential, payload).await?;
    Ok(Json(snapshot))
}

/// Continue a paused round with the time it had left.
#[utoipa::path(
    post,
    path = "/events/{event_id}/timer/resume",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses(
        (status = 200, description = "Round resumed, or ended if no time was left", body = TimerSnapshot),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn resume_timer(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let snapshot =
        timer_service::control_timer(&state, event_id, &credential, TimerCommand::Resume).await?;
    Ok(Json(snapshot))
}

/// End the running round now.
#[utoipa::path(
    post,
    path = "/events/{event_id}/timer/end-round",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses(
        (status = 200, description = "Break started, or event ended after the final round", body = TimerSnapshot),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn end_round(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let snapshot =
        timer_service::control_timer(&state, event_id, &credential, TimerCommand::EndRound)
            .await?;
    Ok(Json(snapshot))
}

/// Leave the break and start the following round.
#[utoipa::path(
    post,
    path = "/events/{event_id}/timer/next-round",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    responses(
        (status = 200, description = "Next round running", body = TimerSnapshot),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn next_round(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let snapshot = timer_service::control_timer(
        &state,
        event_id,
        &credential,
        TimerCommand::StartNextRound,
    )
    .await?;
    Ok(Json(snapshot))
}

/// Change round and/or break length without resetting elapsed time.
#[utoipa::path(
    put,
    path = "/events/{event_id}/timer/duration",
    tag = "timer",
    params(
        ("Authorization" = String, Header, description = "Admin bearer credential"),
        ("event_id" = Uuid, Path, description = "Identifier of the event")
    ),
    request_body = UpdateDurationRequest,
    responses(
        (status = 200, description = "Durations updated", body = TimerSnapshot),
        (status = 400, description = "Invalid durations"),
        (status = 409, description = "Rejected; body carries the unchanged timer", body = crate::dto::timer::ErrorResponse)
    )
)]
pub async fn update_duration(
    State(state): State<SharedState>,
    Path(event_id): Path<Uuid>,
    Extension(credential): Extension<Credential>,
    Valid(Json(payload)): Valid<Json<UpdateDurationRequest>>,
) -> Result<Json<TimerSnapshot>, AppError> {
    let snapshot = timer_service::update_duration(&state, event_id, &credential, payload).await?;
    Ok(Json(snapshot))
}

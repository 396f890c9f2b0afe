use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the round timer service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::timer::get_timer,
        crate::routes::timer::start_timer,
        crate::routes::timer::pause_timer,
        crate::routes::timer::resume_timer,
        crate::routes::timer::end_round,
        crate::routes::timer::next_round,
        crate::routes::timer::update_duration,
        crate::routes::sse::timer_stream,
        crate::routes::events::update_lifecycle,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::timer::TimerSnapshot,
            crate::dto::timer::PauseRequest,
            crate::dto::timer::UpdateDurationRequest,
            crate::dto::timer::RoundEndedEvent,
            crate::dto::timer::ErrorResponse,
            crate::dto::events::LifecycleRequest,
            crate::dto::events::LifecycleResponse,
            crate::state::timer::TimerStatus,
            crate::state::events::EventStatus,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "timer", description = "Round timer reads and organizer controls"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "events", description = "Event lifecycle hand-off"),
    )
)]
pub struct ApiDoc;

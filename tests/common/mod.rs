use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, header},
};
use http_body_util::BodyExt;
use round_timer_back::{
    config::AppConfig,
    routes,
    services::credentials::{Credential, StaticCredentials},
    state::{
        AppState,
        clock::ManualClock,
        events::{EventLifecycle, EventStatus, MemoryEventDirectory},
    },
};
use time::macros::datetime;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const ADMIN_TOKEN: &str = "organizer-token";
pub const VIEWER_TOKEN: &str = "participant-token";

/// Router wired like production, plus handles on the fake clock and the seeded event ids.
pub struct TestApp {
    pub router: Router,
    pub clock: ManualClock,
    pub live_event: Uuid,
    pub upcoming_event: Uuid,
}

/// Build the application with one in-progress event (3 rounds) and one upcoming event.
pub fn build_test_app() -> TestApp {
    let clock = ManualClock::new(datetime!(2026-03-01 18:00:00 UTC));
    let live_event = Uuid::new_v4();
    let upcoming_event = Uuid::new_v4();

    let events = MemoryEventDirectory::with_events([
        (
            live_event,
            EventLifecycle {
                status: EventStatus::InProgress,
                final_round: 3,
            },
        ),
        (
            upcoming_event,
            EventLifecycle {
                status: EventStatus::Upcoming,
                final_round: 3,
            },
        ),
    ]);
    let credentials = StaticCredentials::new([
        (
            ADMIN_TOKEN.to_string(),
            Credential {
                subject: "organizer".into(),
                admin: true,
            },
        ),
        (
            VIEWER_TOKEN.to_string(),
            Credential {
                subject: "participant".into(),
                admin: false,
            },
        ),
    ]);

    let state = AppState::with_collaborators(
        AppConfig::default(),
        Arc::new(clock.clone()),
        Arc::new(events),
        Arc::new(credentials),
    );

    TestApp {
        router: routes::router(state).layer(TraceLayer::new_for_http()),
        clock,
        live_event,
        upcoming_event,
    }
}

/// Build a request with an optional bearer token and optional JSON body.
pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

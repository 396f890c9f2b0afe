//! Integration tests driving the reqwest-backed client against a served router.
#![cfg(feature = "http-client")]

mod common;

use std::sync::Arc;

use axum::Router;
use common::{ADMIN_TOKEN, VIEWER_TOKEN, build_test_app};
use round_timer_back::{
    client::{
        ClientConfig, ClientError, HttpTimerApi, MemoryRecoveryStore, ObserverOptions,
        TimerAction, TimerApi, TimerObserver,
    },
    state::timer::TimerStatus,
};
use tokio::net::TcpListener;
use uuid::Uuid;

/// Serve `app` on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(base_url: &str, token: &str) -> HttpTimerApi {
    HttpTimerApi::new(&ClientConfig::new(base_url, token)).unwrap()
}

#[tokio::test]
async fn fetch_write_and_rejected_write() {
    let app = build_test_app();
    let base_url = serve(app.router).await;
    let api = client(&base_url, ADMIN_TOKEN);

    let fetched = api.fetch(app.live_event).await.unwrap();
    assert_eq!(fetched.status, TimerStatus::Inactive);
    assert_eq!(fetched.final_round, 3);

    let started = api.send(app.live_event, TimerAction::Start).await.unwrap();
    assert_eq!(started.status, TimerStatus::Active);
    assert_eq!(started.current_round, 1);
    assert_eq!(started.epoch, fetched.epoch);
    assert!(started.version > fetched.version);

    app.clock.advance(15);
    let pause = TimerAction::Pause {
        time_remaining: Some(165),
    };
    let paused = api.send(app.live_event, pause.clone()).await.unwrap();
    assert_eq!(paused.pause_time_remaining, Some(165));

    let err = api.send(app.live_event, pause).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    let timer = err.timer().expect("rejection carries the current timer");
    assert_eq!(timer.status, TimerStatus::Paused);
    assert_eq!(timer.version, paused.version);
}

#[tokio::test]
async fn duration_update_is_sent_as_json() {
    let app = build_test_app();
    let base_url = serve(app.router).await;
    let api = client(&base_url, ADMIN_TOKEN);

    api.send(app.live_event, TimerAction::Start).await.unwrap();
    app.clock.advance(60);
    let updated = api
        .send(
            app.live_event,
            TimerAction::UpdateDuration {
                round_duration: Some(240),
                break_duration: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.round_duration, 240);
    assert_eq!(updated.seconds_remaining, 180);
}

#[tokio::test]
async fn refusals_without_timer_map_to_rejected() {
    let app = build_test_app();
    let base_url = serve(app.router).await;

    let viewer = client(&base_url, VIEWER_TOKEN);
    match viewer.send(app.live_event, TimerAction::Start).await {
        Err(ClientError::Rejected { status, timer, .. }) => {
            assert_eq!(status, 403);
            assert!(timer.is_none());
        }
        other => panic!("expected a 403 rejection, got {other:?}"),
    }

    let stranger = client(&base_url, "not-a-token");
    let err = stranger.fetch(app.live_event).await.unwrap_err();
    assert_eq!(err.status(), Some(401));

    let err = viewer.fetch(Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn unreachable_authority_is_a_send_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let err = client(&base_url, ADMIN_TOKEN)
        .fetch(Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::RequestSend { .. }));
}

#[tokio::test]
async fn observer_controls_timer_over_http() {
    let app = build_test_app();
    let base_url = serve(app.router).await;
    let api = Arc::new(client(&base_url, ADMIN_TOKEN));

    let observer = TimerObserver::spawn(
        api,
        app.live_event,
        ObserverOptions {
            recovery: Arc::new(MemoryRecoveryStore::new()),
            clock: Arc::new(app.clock.clone()),
            ..ObserverOptions::default()
        },
    );

    let started = observer.control(TimerAction::Start).await.unwrap();
    assert_eq!(started.status, TimerStatus::Active);
    let view = observer.current();
    assert_eq!(view.status, TimerStatus::Active);
    assert_eq!(view.current_round, 1);
    assert_eq!(view.seconds_remaining, 180);

    let err = observer.control(TimerAction::NextRound).await.unwrap_err();
    assert_eq!(err.status(), Some(409));
    assert_eq!(observer.current().status, TimerStatus::Active);

    observer.stop().await;
}

//! Authority operations behind the timer API. Every read and write runs under the event's record
//! lock and first applies lazy expiry, so concurrent callers converge on one outcome.

use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        events::{LifecycleRequest, LifecycleResponse},
        timer::{PauseRequest, TimerSnapshot, UpdateDurationRequest},
    },
    error::ServiceError,
    services::{credentials::Credential, sse_events},
    state::{
        SharedState, TimerAuthority,
        events::EventLifecycle,
        timer::{TimerCommand, TimerRecord},
    },
};

/// Read the timer, ending the running round first when its time ran out.
pub async fn fetch_timer(state: &SharedState, event_id: Uuid) -> Result<TimerSnapshot, ServiceError> {
    let authority = require_authority(state, event_id).await?;
    let mut record = authority.lock().await;
    let now = state.now();
    expire_and_broadcast(&authority, &mut record, now);
    Ok(TimerSnapshot::capture(&record, now))
}

/// Apply an admin control action and return the post-transition snapshot.
pub async fn control_timer(
    state: &SharedState,
    event_id: Uuid,
    credential: &Credential,
    command: TimerCommand,
) -> Result<TimerSnapshot, ServiceError> {
    ensure_admin(credential)?;

    let lifecycle = state
        .events()
        .lifecycle(event_id)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("event `{event_id}` not found")))?;
    let authority = require_authority(state, event_id).await?;

    let mut record = authority.lock().await;
    let now = state.now();
    expire_and_broadcast(&authority, &mut record, now);

    if !lifecycle.status.is_live_eligible() {
        warn!(
            %event_id,
            command = command.name(),
            lifecycle = ?lifecycle.status,
            "timer control refused for event that is not live"
        );
        return Err(ServiceError::rejected(
            format!(
                "event is {:?}; timer controls require a live event",
                lifecycle.status
            ),
            TimerSnapshot::capture(&record, now),
        ));
    }

    if command == TimerCommand::Start {
        record.provision(lifecycle.final_round, None, None);
    }

    match record.apply(command, now) {
        Ok(outcome) => {
            let snapshot = TimerSnapshot::capture(&record, now);
            info!(
                %event_id,
                subject = %credential.subject,
                command = command.name(),
                status = ?snapshot.status,
                round = snapshot.current_round,
                remaining = snapshot.seconds_remaining,
                "timer transition applied"
            );
            if let Some(round) = outcome.round_ended {
                sse_events::broadcast_round_ended(&authority, event_id, round);
            }
            sse_events::broadcast_timer_updated(&authority, &snapshot);
            Ok(snapshot)
        }
        Err(err) => {
            warn!(
                %event_id,
                subject = %credential.subject,
                command = command.name(),
                error = %err,
                "timer transition rejected"
            );
            Err(ServiceError::rejected(
                err.to_string(),
                TimerSnapshot::capture(&record, now),
            ))
        }
    }
}

/// Pause the running round. The caller's displayed remaining time is only compared for logging.
pub async fn pause_timer(
    state: &SharedState,
    event_id: Uuid,
    credential: &Credential,
    request: PauseRequest,
) -> Result<TimerSnapshot, ServiceError> {
    let snapshot = control_timer(state, event_id, credential, TimerCommand::Pause).await?;
    if let Some(reported) = request.time_remaining {
        let preserved = snapshot.pause_time_remaining.unwrap_or_default();
        if reported != preserved {
            debug!(%event_id, reported, preserved, "client countdown differed from authority at pause");
        }
    }
    Ok(snapshot)
}

/// Change round and/or break length.
pub async fn update_duration(
    state: &SharedState,
    event_id: Uuid,
    credential: &Credential,
    request: UpdateDurationRequest,
) -> Result<TimerSnapshot, ServiceError> {
    control_timer(
        state,
        event_id,
        credential,
        TimerCommand::UpdateDuration {
            round_duration: request.round_duration,
            break_duration: request.break_duration,
        },
    )
    .await
}

/// Record an event lifecycle change and provision the timer if it has not started yet.
pub async fn update_lifecycle(
    state: &SharedState,
    event_id: Uuid,
    credential: &Credential,
    request: LifecycleRequest,
) -> Result<LifecycleResponse, ServiceError> {
    ensure_admin(credential)?;

    let lifecycle = EventLifecycle {
        status: request.status,
        final_round: request.final_round,
    };
    state.events().upsert(event_id, lifecycle).await;
    let authority = require_authority(state, event_id).await?;

    let mut record = authority.lock().await;
    let now = state.now();
    expire_and_broadcast(&authority, &mut record, now);
    if record.provision(
        lifecycle.final_round,
        request.round_duration,
        request.break_duration,
    ) {
        debug!(%event_id, final_round = lifecycle.final_round, "timer provisioned");
    }

    let timer = TimerSnapshot::capture(&record, now);
    info!(%event_id, status = ?lifecycle.status, "event lifecycle updated");
    sse_events::broadcast_timer_updated(&authority, &timer);

    Ok(LifecycleResponse {
        event_id,
        status: lifecycle.status,
        final_round: lifecycle.final_round,
        timer,
    })
}

/// Expire every overdue round, including events nobody is polling. Returns how many ended.
pub async fn sweep_expired(state: &SharedState) -> usize {
    let mut expired = 0;
    for (_event_id, authority) in state.authorities() {
        let mut record = authority.lock().await;
        if expire_and_broadcast(&authority, &mut record, state.now()).is_some() {
            expired += 1;
        }
    }
    expired
}

async fn require_authority(
    state: &SharedState,
    event_id: Uuid,
) -> Result<std::sync::Arc<TimerAuthority>, ServiceError> {
    state
        .authority(event_id)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("event `{event_id}` not found")))
}

fn ensure_admin(credential: &Credential) -> Result<(), ServiceError> {
    if credential.admin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "timer controls require an admin credential".into(),
        ))
    }
}

fn expire_and_broadcast(
    authority: &TimerAuthority,
    record: &mut TimerRecord,
    now: OffsetDateTime,
) -> Option<u32> {
    let round = record.expire_if_due(now)?;
    let event_id = record.event_id();
    info!(%event_id, round, status = ?record.status(), "round time elapsed");
    sse_events::broadcast_round_ended(authority, event_id, round);
    sse_events::broadcast_timer_updated(authority, &TimerSnapshot::capture(record, now));
    Some(round)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use time::macros::datetime;

    use super::*;
    use crate::{
        config::AppConfig,
        dto::{sse::TimerStreamEvent, timer::RoundEndedEvent},
        services::credentials::StaticCredentials,
        state::{
            AppState,
            clock::ManualClock,
            events::{EventStatus, MemoryEventDirectory},
            timer::TimerStatus,
        },
    };

    fn admin() -> Credential {
        Credential {
            subject: "host".into(),
            admin: true,
        }
    }

    fn setup(status: EventStatus, final_round: u32) -> (SharedState, ManualClock, Uuid) {
        let clock = ManualClock::new(datetime!(2026-03-01 18:00:00 UTC));
        let event_id = Uuid::new_v4();
        let events = MemoryEventDirectory::with_events([(
            event_id,
            EventLifecycle {
                status,
                final_round,
            },
        )]);
        let state = AppState::with_collaborators(
            AppConfig::from_json("{}").unwrap(),
            Arc::new(clock.clone()),
            Arc::new(events),
            Arc::new(StaticCredentials::default()),
        );
        (state, clock, event_id)
    }

    #[tokio::test]
    async fn pause_and_resume_after_an_hour_keeps_remaining_time() {
        let (state, clock, event_id) = setup(EventStatus::InProgress, 3);

        control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        clock.advance(170);
        let snapshot = fetch_timer(&state, event_id).await.unwrap();
        assert_eq!(snapshot.status, TimerStatus::Active);
        assert_eq!(snapshot.seconds_remaining, 10);

        let paused = pause_timer(
            &state,
            event_id,
            &admin(),
            PauseRequest {
                time_remaining: Some(10),
            },
        )
        .await
        .unwrap();
        assert_eq!(paused.status, TimerStatus::Paused);
        assert_eq!(paused.pause_time_remaining, Some(10));

        clock.advance(3600);
        let resumed = control_timer(&state, event_id, &admin(), TimerCommand::Resume)
            .await
            .unwrap();
        assert_eq!(resumed.status, TimerStatus::Active);
        assert_eq!(resumed.seconds_remaining, 10);

        clock.advance(10);
        let expired = fetch_timer(&state, event_id).await.unwrap();
        assert_eq!(expired.status, TimerStatus::BreakTime);
        assert_eq!(expired.current_round, 1);
    }

    #[tokio::test]
    async fn final_round_expiry_ends_event_and_rejects_next_round() {
        let (state, clock, event_id) = setup(EventStatus::InProgress, 2);

        control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        control_timer(&state, event_id, &admin(), TimerCommand::EndRound)
            .await
            .unwrap();
        control_timer(&state, event_id, &admin(), TimerCommand::StartNextRound)
            .await
            .unwrap();

        clock.advance(180);
        let snapshot = fetch_timer(&state, event_id).await.unwrap();
        assert_eq!(snapshot.status, TimerStatus::Ended);
        assert_eq!(snapshot.current_round, 2);

        let err = control_timer(&state, event_id, &admin(), TimerCommand::StartNextRound)
            .await
            .unwrap_err();
        match err {
            ServiceError::Rejected { snapshot, .. } => {
                assert_eq!(snapshot.status, TimerStatus::Ended)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn writes_expire_overdue_round_before_applying() {
        let (state, clock, event_id) = setup(EventStatus::InProgress, 3);
        control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        clock.advance(200);

        let err = control_timer(&state, event_id, &admin(), TimerCommand::Pause)
            .await
            .unwrap_err();
        match err {
            ServiceError::Rejected { snapshot, .. } => {
                assert_eq!(snapshot.status, TimerStatus::BreakTime)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn second_pause_is_rejected_with_current_snapshot() {
        let (state, clock, event_id) = setup(EventStatus::InProgress, 3);
        control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        clock.advance(20);
        let first = control_timer(&state, event_id, &admin(), TimerCommand::Pause)
            .await
            .unwrap();

        clock.advance(5);
        let err = control_timer(&state, event_id, &admin(), TimerCommand::Pause)
            .await
            .unwrap_err();
        match err {
            ServiceError::Rejected { snapshot, .. } => assert_eq!(*snapshot, first),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_admin_and_non_live_writes_are_refused() {
        let (state, _clock, event_id) = setup(EventStatus::Upcoming, 3);
        let viewer = Credential {
            subject: "guest".into(),
            admin: false,
        };

        let err = control_timer(&state, event_id, &viewer, TimerCommand::Start)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        let err = control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap_err();
        match err {
            ServiceError::Rejected { snapshot, .. } => {
                assert_eq!(snapshot.status, TimerStatus::Inactive)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let (state, _clock, _event_id) = setup(EventStatus::InProgress, 3);
        let err = fetch_timer(&state, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn start_uses_final_round_from_lifecycle() {
        let (state, _clock, event_id) = setup(EventStatus::InProgress, 3);
        fetch_timer(&state, event_id).await.unwrap();
        state
            .events()
            .upsert(
                event_id,
                EventLifecycle {
                    status: EventStatus::InProgress,
                    final_round: 5,
                },
            )
            .await;

        let started = control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        assert_eq!(started.final_round, 5);
    }

    #[tokio::test]
    async fn sweep_expires_unobserved_rounds_and_notifies_subscribers() {
        let (state, clock, event_id) = setup(EventStatus::InProgress, 3);
        control_timer(&state, event_id, &admin(), TimerCommand::Start)
            .await
            .unwrap();
        let authority = state.existing_authority(event_id).unwrap();
        let mut events = authority.hub().subscribe();

        clock.advance(179);
        assert_eq!(sweep_expired(&state).await, 0);
        clock.advance(1);
        assert_eq!(sweep_expired(&state).await, 1);
        assert_eq!(sweep_expired(&state).await, 0);

        assert_eq!(
            events.recv().await.unwrap(),
            TimerStreamEvent::RoundEnded(RoundEndedEvent { event_id, round: 1 })
        );
        match events.recv().await.unwrap() {
            TimerStreamEvent::Updated(snapshot) => {
                assert_eq!(snapshot.status, TimerStatus::BreakTime);
            }
            other => panic!("expected timer update, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn lifecycle_update_provisions_inactive_timer() {
        let (state, _clock, _event_id) = setup(EventStatus::InProgress, 3);
        let event_id = Uuid::new_v4();

        let response = update_lifecycle(
            &state,
            event_id,
            &admin(),
            LifecycleRequest {
                status: EventStatus::InProgress,
                final_round: 4,
                round_duration: Some(300),
                break_duration: Some(45),
            },
        )
        .await
        .unwrap();

        assert_eq!(response.timer.status, TimerStatus::Inactive);
        assert_eq!(response.timer.final_round, 4);
        assert_eq!(response.timer.round_duration, 300);
        assert_eq!(response.timer.break_duration, 45);
    }
}

//! Per-client timer observer: one poll loop, one countdown ticker, one notification stream.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, Notify, broadcast, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    dto::timer::{RoundEndedEvent, TimerSnapshot},
    state::{
        clock::{Clock, SystemClock},
        timer::TimerStatus,
    },
};

use super::{
    api::{TimerAction, TimerApi},
    config::{ClientConfig, DEFAULT_POLL_INTERVAL},
    error::ClientResult,
    machine::{ClientTimerStateMachine, ClientTimerView, TickOutcome, TickerDirective},
    notifier::NotificationEmitter,
    recovery::{MemoryRecoveryStore, RecoveredView, RecoveryStore},
    scheduler,
    ticker::LocalCountdownTicker,
};

/// Collaborators and tuning for a [`TimerObserver`].
#[derive(Clone)]
pub struct ObserverOptions {
    /// Identifies this client in the recovery store.
    pub client_id: Uuid,
    pub poll_interval: Duration,
    pub recovery: Arc<dyn RecoveryStore>,
    pub clock: Arc<dyn Clock>,
    pub notifier: NotificationEmitter,
}

impl Default for ObserverOptions {
    fn default() -> Self {
        Self {
            client_id: Uuid::new_v4(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            recovery: Arc::new(MemoryRecoveryStore::new()),
            clock: Arc::new(SystemClock),
            notifier: NotificationEmitter::new(),
        }
    }
}

impl ObserverOptions {
    /// Defaults with the poll interval taken from `config`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            ..Self::default()
        }
    }
}

struct CoreInner {
    machine: ClientTimerStateMachine,
    ticker: LocalCountdownTicker,
}

/// State shared by the poll loop, the ticker and the observer handle.
pub(crate) struct ObserverCore {
    event_id: Uuid,
    client_id: Uuid,
    clock: Arc<dyn Clock>,
    recovery: Arc<dyn RecoveryStore>,
    notifier: NotificationEmitter,
    view: watch::Sender<ClientTimerView>,
    inner: Mutex<CoreInner>,
}

impl ObserverCore {
    pub(crate) fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Reconcile an authoritative snapshot and drive the ticker accordingly.
    pub(crate) async fn apply_snapshot(self: &Arc<Self>, snapshot: &TimerSnapshot) {
        let mut inner = self.inner.lock().await;
        let outcome = inner.machine.reconcile(snapshot, self.clock.now());
        if !outcome.applied {
            debug!(
                event_id = %self.event_id,
                version = snapshot.version,
                "dropping out-of-order timer snapshot"
            );
            return;
        }

        match outcome.directive {
            TickerDirective::Start { generation } => {
                inner.ticker.restart(generation, Arc::clone(self));
            }
            TickerDirective::Stop => inner.ticker.stop(),
            TickerDirective::Keep => {}
        }

        let view = inner.machine.view().clone();
        drop(inner);
        self.publish(view, outcome.round_ended);
    }

    /// One ticker step; returns whether the ticker should keep running.
    pub(crate) async fn tick(&self, generation: u64) -> bool {
        let mut inner = self.inner.lock().await;
        match inner.machine.tick(generation) {
            TickOutcome::Stale => false,
            TickOutcome::Counting => {
                self.view.send_replace(inner.machine.view().clone());
                true
            }
            TickOutcome::Finished { round_ended } => {
                let view = inner.machine.view().clone();
                drop(inner);
                self.publish(view, round_ended);
                false
            }
        }
    }

    /// Persist `view` for recovery, expose it and emit any end-of-round signal.
    fn publish(&self, view: ClientTimerView, round_ended: Option<u32>) {
        // Nothing left to recover once the event is over.
        if view.status == TimerStatus::Ended {
            self.recovery.clear(self.event_id, self.client_id);
        } else {
            self.recovery
                .save(self.client_id, &RecoveredView::capture(&view, self.clock.now()));
        }
        self.view.send_replace(view);
        if let Some(round) = round_ended {
            self.notifier.emit(RoundEndedEvent {
                event_id: self.event_id,
                round,
            });
        }
    }

    async fn halt(&self) {
        let mut inner = self.inner.lock().await;
        inner.ticker.stop();
        inner.machine.halt();
    }
}

/// Keeps a client's view of one event's timer in sync with the authority.
///
/// Dropping the observer stops its poll loop and ticker.
pub struct TimerObserver {
    event_id: Uuid,
    api: Arc<dyn TimerApi>,
    core: Arc<ObserverCore>,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    scheduler: Option<JoinHandle<()>>,
}

impl TimerObserver {
    /// Restore any recovered view, then start polling. Must be called within a Tokio runtime.
    pub fn spawn(api: Arc<dyn TimerApi>, event_id: Uuid, options: ObserverOptions) -> Self {
        let mut machine = ClientTimerStateMachine::new(event_id);
        if let Some(recovered) = options.recovery.load(event_id, options.client_id) {
            if machine.restore(&recovered, options.clock.now()) {
                debug!(%event_id, status = ?recovered.status, "showing recovered timer view");
            }
        }

        let cancel = CancellationToken::new();
        let (view, _) = watch::channel(machine.view().clone());
        let core = Arc::new(ObserverCore {
            event_id,
            client_id: options.client_id,
            clock: options.clock,
            recovery: options.recovery,
            notifier: options.notifier,
            view,
            inner: Mutex::new(CoreInner {
                machine,
                ticker: LocalCountdownTicker::new(cancel.clone()),
            }),
        });

        let refresh = Arc::new(Notify::new());
        let scheduler = tokio::spawn(scheduler::run(
            Arc::clone(&api),
            Arc::clone(&core),
            options.poll_interval,
            Arc::clone(&refresh),
            cancel.child_token(),
        ));

        Self {
            event_id,
            api,
            core,
            refresh,
            cancel,
            scheduler: Some(scheduler),
        }
    }

    /// Event this observer follows.
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Live view updates.
    pub fn view(&self) -> watch::Receiver<ClientTimerView> {
        self.core.view.subscribe()
    }

    /// View as of now.
    pub fn current(&self) -> ClientTimerView {
        self.core.view.borrow().clone()
    }

    /// End-of-round signals, at most one per round expiry.
    pub fn notifications(&self) -> broadcast::Receiver<RoundEndedEvent> {
        self.core.notifier.subscribe()
    }

    /// Poll now instead of waiting for the next interval.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Send a control action. The returned (or rejected-with) snapshot is applied straight away
    /// and a fresh read is queued.
    pub async fn control(&self, action: TimerAction) -> ClientResult<TimerSnapshot> {
        let result = self.api.send(self.event_id, action.clone()).await;
        match &result {
            Ok(snapshot) => self.core.apply_snapshot(snapshot).await,
            Err(err) => {
                warn!(event_id = %self.event_id, ?action, error = %err, "timer control failed");
                if let Some(snapshot) = err.timer() {
                    self.core.apply_snapshot(snapshot).await;
                }
            }
        }
        self.refresh_now();
        result
    }

    /// Pause, reporting the countdown currently displayed.
    pub async fn pause(&self) -> ClientResult<TimerSnapshot> {
        let time_remaining = Some(self.current().seconds_remaining);
        self.control(TimerAction::Pause { time_remaining }).await
    }

    /// Stop polling and ticking and wait for the poll loop to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        self.core.halt().await;
        if let Some(handle) = self.scheduler.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for TimerObserver {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

//! Per-client reconciliation of authoritative snapshots into a displayable countdown.
//!
//! The machine is synchronous and clock-agnostic: callers pass `now` in. It owns the
//! "already notified" flag and the ticker generation counter, which together guarantee one
//! end-of-round signal per expiry and at most one live decrement loop.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    client::recovery::RecoveredView,
    dto::timer::TimerSnapshot,
    state::{clock, timer::TimerStatus},
};

/// Where the currently displayed values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewSource {
    /// Nothing known yet.
    Initial,
    /// Reconstructed from the recovery store; advisory until the first poll lands.
    Recovered,
    /// Taken from an authoritative snapshot.
    Authoritative,
    /// Derived locally since the last snapshot (ticks or local pre-emption).
    Local,
}

/// What a client renders for one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTimerView {
    /// Event the timer belongs to.
    pub event_id: Uuid,
    /// Status as last reconciled or derived locally.
    pub status: TimerStatus,
    /// Zero until the first round starts.
    pub current_round: u32,
    /// Number of rounds in the event.
    pub final_round: u32,
    /// Round length in seconds.
    pub round_duration: u32,
    /// Break length in seconds.
    pub break_duration: u32,
    /// Seconds left on the displayed countdown.
    pub seconds_remaining: u32,
    /// Where the displayed values came from.
    pub source: ViewSource,
}

impl ClientTimerView {
    /// Placeholder shown before anything is known about the event.
    pub fn initial(event_id: Uuid) -> Self {
        Self {
            event_id,
            status: TimerStatus::Inactive,
            current_round: 0,
            final_round: 1,
            round_duration: 0,
            break_duration: 0,
            seconds_remaining: 0,
            source: ViewSource::Initial,
        }
    }

    /// Whether a local countdown should be running for this view.
    pub fn is_counting(&self) -> bool {
        self.status == TimerStatus::Active && self.seconds_remaining > 0
    }

    fn driving_state(&self) -> (TimerStatus, u32, u32) {
        (self.status, self.seconds_remaining, self.current_round)
    }
}

/// Instruction for the countdown ticker after a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerDirective {
    /// Leave the current ticker (or its absence) alone.
    Keep,
    /// Tear down any running ticker and start a fresh one bound to `generation`.
    Start {
        /// Ticks from any other generation are ignored.
        generation: u64,
    },
    /// Tear down the running ticker.
    Stop,
}

/// Result of feeding a snapshot to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    /// False when the snapshot was dropped (other event or out-of-order version).
    pub applied: bool,
    /// What to do with the countdown ticker.
    pub directive: TickerDirective,
    /// Round whose end should be signalled now, if any.
    pub round_ended: Option<u32>,
}

impl Reconciliation {
    fn ignored() -> Self {
        Self {
            applied: false,
            directive: TickerDirective::Keep,
            round_ended: None,
        }
    }
}

/// Result of one ticker step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The tick came from a superseded ticker; it must stop without touching anything.
    Stale,
    /// Decremented, still above zero.
    Counting,
    /// Reached zero and pre-empted to the post-round status; the ticker must stop.
    Finished {
        /// Round whose end should be signalled now, if any.
        round_ended: Option<u32>,
    },
}

/// Client-side timer state for one observed event.
#[derive(Debug, Clone)]
pub struct ClientTimerStateMachine {
    view: ClientTimerView,
    /// Epoch and version of the last applied snapshot.
    last_applied: Option<(Uuid, u64)>,
    notified_round: Option<u32>,
    generation: u64,
    ticking: bool,
}

impl ClientTimerStateMachine {
    /// Empty machine for `event_id`.
    pub fn new(event_id: Uuid) -> Self {
        Self {
            view: ClientTimerView::initial(event_id),
            last_applied: None,
            notified_round: None,
            generation: 0,
            ticking: false,
        }
    }

    /// Values to render right now.
    pub fn view(&self) -> &ClientTimerView {
        &self.view
    }

    /// Generation of the ticker currently allowed to decrement.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a ticker is expected to be running.
    pub fn is_ticking(&self) -> bool {
        self.ticking
    }

    /// Show a best-effort state from the recovery store. Only applies before the first snapshot.
    pub fn restore(&mut self, recovered: &RecoveredView, now: OffsetDateTime) -> bool {
        if self.view.source != ViewSource::Initial || recovered.event_id != self.view.event_id {
            return false;
        }

        let mut status = recovered.status;
        let mut seconds_remaining = recovered.seconds_remaining;
        if status == TimerStatus::Active {
            let elapsed = (now - recovered.saved_at).whole_seconds().max(0);
            let elapsed = u32::try_from(elapsed).unwrap_or(u32::MAX);
            seconds_remaining = seconds_remaining.saturating_sub(elapsed);
            if seconds_remaining == 0 {
                status = post_round_status(recovered.current_round, recovered.final_round);
            }
        }

        self.view = ClientTimerView {
            event_id: recovered.event_id,
            status,
            current_round: recovered.current_round,
            final_round: recovered.final_round,
            round_duration: recovered.round_duration,
            break_duration: recovered.break_duration,
            seconds_remaining,
            source: ViewSource::Recovered,
        };
        true
    }

    /// Snap the view to an authoritative snapshot observed at local time `now`.
    pub fn reconcile(&mut self, snapshot: &TimerSnapshot, now: OffsetDateTime) -> Reconciliation {
        if snapshot.event_id != self.view.event_id {
            return Reconciliation::ignored();
        }
        // A new epoch means the authority rebuilt its record; its versions start over.
        if self
            .last_applied
            .is_some_and(|(epoch, version)| epoch == snapshot.epoch && snapshot.version < version)
        {
            return Reconciliation::ignored();
        }
        self.last_applied = Some((snapshot.epoch, snapshot.version));

        let previous = self.view.clone();
        let (status, seconds_remaining) = match snapshot.status {
            TimerStatus::Active => {
                let remaining = snapshot
                    .round_start_time
                    .map(|start| clock::remaining(now, start, snapshot.round_duration))
                    .unwrap_or(snapshot.seconds_remaining);
                if remaining == 0 {
                    (
                        post_round_status(snapshot.current_round, snapshot.final_round),
                        0,
                    )
                } else {
                    (TimerStatus::Active, remaining)
                }
            }
            TimerStatus::Paused => (
                TimerStatus::Paused,
                snapshot
                    .pause_time_remaining
                    .unwrap_or(snapshot.seconds_remaining),
            ),
            other => (other, 0),
        };

        self.view = ClientTimerView {
            event_id: snapshot.event_id,
            status,
            current_round: snapshot.current_round,
            final_round: snapshot.final_round,
            round_duration: snapshot.round_duration,
            break_duration: snapshot.break_duration,
            seconds_remaining,
            source: if status == snapshot.status {
                ViewSource::Authoritative
            } else {
                ViewSource::Local
            },
        };

        let was_running = matches!(previous.status, TimerStatus::Active | TimerStatus::Paused)
            && previous.source != ViewSource::Initial;
        let round_over = matches!(status, TimerStatus::BreakTime | TimerStatus::Ended);
        let round_ended = if round_over
            && ((was_running && previous.current_round == snapshot.current_round)
                || status != snapshot.status)
        {
            self.mark_notified(snapshot.current_round)
        } else if was_running && snapshot.current_round > previous.current_round {
            // The round was ended and the next one started between two polls.
            self.mark_notified(previous.current_round)
        } else {
            None
        };

        if seconds_remaining > 0 && self.notified_round != round_ended {
            self.notified_round = None;
        }

        let directive = self.ticker_directive(previous.driving_state());
        Reconciliation {
            applied: true,
            directive,
            round_ended,
        }
    }

    /// One-second decrement requested by the ticker bound to `generation`.
    pub fn tick(&mut self, generation: u64) -> TickOutcome {
        if generation != self.generation || !self.ticking || !self.view.is_counting() {
            return TickOutcome::Stale;
        }

        self.view.seconds_remaining -= 1;
        self.view.source = ViewSource::Local;
        if self.view.seconds_remaining > 0 {
            return TickOutcome::Counting;
        }

        self.ticking = false;
        self.view.status = post_round_status(self.view.current_round, self.view.final_round);
        TickOutcome::Finished {
            round_ended: self.mark_notified(self.view.current_round),
        }
    }

    /// Invalidate any running ticker, e.g. when the observer is torn down.
    pub fn halt(&mut self) {
        self.generation += 1;
        self.ticking = false;
    }

    fn ticker_directive(&mut self, previous: (TimerStatus, u32, u32)) -> TickerDirective {
        let counting = self.view.is_counting();
        let changed = previous != self.view.driving_state();
        if counting && (changed || !self.ticking) {
            self.generation += 1;
            self.ticking = true;
            TickerDirective::Start {
                generation: self.generation,
            }
        } else if !counting && self.ticking {
            self.generation += 1;
            self.ticking = false;
            TickerDirective::Stop
        } else {
            TickerDirective::Keep
        }
    }

    fn mark_notified(&mut self, round: u32) -> Option<u32> {
        if self.notified_round == Some(round) {
            return None;
        }
        self.notified_round = Some(round);
        Some(round)
    }
}

/// Status a round falls into once its time is up.
fn post_round_status(current_round: u32, final_round: u32) -> TimerStatus {
    if current_round >= final_round {
        TimerStatus::Ended
    } else {
        TimerStatus::BreakTime
    }
}

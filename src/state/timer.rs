//! Authoritative per-event timer record and its transitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::clock;

/// Discrete lifecycle status of an event's round timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// No round has started yet.
    Inactive,
    /// A round is counting down.
    Active,
    /// A round is frozen with its remaining time preserved.
    Paused,
    /// Between two rounds, waiting for an explicit start of the next one.
    BreakTime,
    /// The final round is over. Terminal.
    Ended,
}

/// Status together with the timing data that is only meaningful for that status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// No round has started yet.
    Inactive,
    /// Counting down from `round_start_time`.
    Active {
        /// Wall-clock instant the remaining time is derived from.
        round_start_time: OffsetDateTime,
    },
    /// Frozen with `time_remaining` seconds left.
    Paused {
        /// Seconds that were left when the round was paused.
        time_remaining: u32,
    },
    /// Between rounds.
    BreakTime,
    /// Terminal.
    Ended,
}

impl TimerPhase {
    /// Status discriminant without timing data.
    pub fn status(&self) -> TimerStatus {
        match self {
            TimerPhase::Inactive => TimerStatus::Inactive,
            TimerPhase::Active { .. } => TimerStatus::Active,
            TimerPhase::Paused { .. } => TimerStatus::Paused,
            TimerPhase::BreakTime => TimerStatus::BreakTime,
            TimerPhase::Ended => TimerStatus::Ended,
        }
    }
}

/// Control actions accepted by the timer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start round one from the inactive state.
    Start,
    /// Freeze the running round.
    Pause,
    /// Continue a paused round.
    Resume,
    /// Finish the running round now.
    EndRound,
    /// Leave the break and start the following round.
    StartNextRound,
    /// Change round and/or break length.
    UpdateDuration {
        /// New round length in seconds.
        round_duration: Option<u32>,
        /// New break length in seconds.
        break_duration: Option<u32>,
    },
}

impl TimerCommand {
    /// Short kebab-case name used in logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            TimerCommand::Start => "start",
            TimerCommand::Pause => "pause",
            TimerCommand::Resume => "resume",
            TimerCommand::EndRound => "end-round",
            TimerCommand::StartNextRound => "start-next-round",
            TimerCommand::UpdateDuration { .. } => "update-duration",
        }
    }
}

/// Reasons a command is refused. The record is left untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The command is not defined for the current status.
    #[error("invalid transition: `{command}` cannot be applied while {from:?}")]
    InvalidTransition {
        /// Status the record was in.
        from: TimerStatus,
        /// Name of the refused command.
        command: &'static str,
    },
    /// Every configured round has already been played.
    #[error("round {final_round} is the final round")]
    FinalRoundReached {
        /// Configured number of rounds.
        final_round: u32,
    },
    /// Round length must be at least one second.
    #[error("round duration must be strictly positive")]
    ZeroRoundDuration,
}

/// Side effects of an applied command, used to drive notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionOutcome {
    /// Round that finished as part of this transition, if any.
    pub round_ended: Option<u32>,
}

/// Authoritative round timer for a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerRecord {
    event_id: Uuid,
    epoch: Uuid,
    phase: TimerPhase,
    current_round: u32,
    final_round: u32,
    round_duration: u32,
    break_duration: u32,
    version: u64,
}

impl TimerRecord {
    /// Fresh inactive record for a newly provisioned event.
    pub fn new(event_id: Uuid, final_round: u32, round_duration: u32, break_duration: u32) -> Self {
        Self {
            event_id,
            epoch: Uuid::new_v4(),
            phase: TimerPhase::Inactive,
            current_round: 0,
            final_round: final_round.max(1),
            round_duration: round_duration.max(1),
            break_duration,
            version: 0,
        }
    }

    /// Identifier of the owning event.
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Identity of this record instance. A record rebuilt after a restart gets a new epoch and
    /// restarts its version count.
    pub fn epoch(&self) -> Uuid {
        self.epoch
    }

    /// Current phase with timing data.
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    /// Current status.
    pub fn status(&self) -> TimerStatus {
        self.phase.status()
    }

    /// Round being played or last played; zero before the first start.
    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    /// Number of rounds configured for the event.
    pub fn final_round(&self) -> u32 {
        self.final_round
    }

    /// Round length in seconds.
    pub fn round_duration(&self) -> u32 {
        self.round_duration
    }

    /// Informational break length in seconds.
    pub fn break_duration(&self) -> u32 {
        self.break_duration
    }

    /// Incremented on every applied transition.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Seconds left in the round at `now`. Zero outside of active and paused.
    pub fn seconds_remaining(&self, now: OffsetDateTime) -> u32 {
        match self.phase {
            TimerPhase::Active { round_start_time } => {
                clock::remaining(now, round_start_time, self.round_duration)
            }
            TimerPhase::Paused { time_remaining } => time_remaining,
            _ => 0,
        }
    }

    /// Re-provision an inactive record with the values supplied by the event lifecycle.
    ///
    /// Returns `false` and leaves the record alone once a round has started.
    pub fn provision(
        &mut self,
        final_round: u32,
        round_duration: Option<u32>,
        break_duration: Option<u32>,
    ) -> bool {
        if self.phase != TimerPhase::Inactive {
            return false;
        }
        self.final_round = final_round.max(1);
        if let Some(round_duration) = round_duration.filter(|value| *value > 0) {
            self.round_duration = round_duration;
        }
        if let Some(break_duration) = break_duration {
            self.break_duration = break_duration;
        }
        true
    }

    /// End the running round if its time ran out. Returns the round that ended.
    pub fn expire_if_due(&mut self, now: OffsetDateTime) -> Option<u32> {
        match self.phase {
            TimerPhase::Active { .. } if self.seconds_remaining(now) == 0 => {
                let round = self.finish_round();
                self.version += 1;
                Some(round)
            }
            _ => None,
        }
    }

    /// Apply `command` at `now`. On error the record is unchanged.
    pub fn apply(
        &mut self,
        command: TimerCommand,
        now: OffsetDateTime,
    ) -> Result<TransitionOutcome, TransitionError> {
        let mut next = self.clone();
        let outcome = next.compute_transition(command, now)?;
        next.version = self.version + 1;
        *self = next;
        Ok(outcome)
    }

    fn compute_transition(
        &mut self,
        command: TimerCommand,
        now: OffsetDateTime,
    ) -> Result<TransitionOutcome, TransitionError> {
        let mut outcome = TransitionOutcome::default();
        match (self.phase, command) {
            (TimerPhase::Inactive, TimerCommand::Start) => {
                self.current_round = 1;
                self.phase = TimerPhase::Active {
                    round_start_time: now,
                };
            }
            (TimerPhase::Active { round_start_time }, TimerCommand::Pause) => {
                self.phase = TimerPhase::Paused {
                    time_remaining: clock::remaining(now, round_start_time, self.round_duration),
                };
            }
            (TimerPhase::Paused { time_remaining }, TimerCommand::Resume) => {
                if time_remaining > 0 {
                    self.phase = TimerPhase::Active {
                        round_start_time: clock::start_for_remaining(
                            now,
                            self.round_duration,
                            time_remaining,
                        ),
                    };
                } else {
                    outcome.round_ended = Some(self.finish_round());
                }
            }
            (TimerPhase::Active { .. }, TimerCommand::EndRound) => {
                outcome.round_ended = Some(self.finish_round());
            }
            (TimerPhase::BreakTime, TimerCommand::StartNextRound) => {
                if self.current_round >= self.final_round {
                    return Err(TransitionError::FinalRoundReached {
                        final_round: self.final_round,
                    });
                }
                self.current_round += 1;
                self.phase = TimerPhase::Active {
                    round_start_time: now,
                };
            }
            (
                TimerPhase::Active { .. } | TimerPhase::Paused { .. } | TimerPhase::BreakTime,
                TimerCommand::UpdateDuration {
                    round_duration,
                    break_duration,
                },
            ) => {
                if round_duration == Some(0) {
                    return Err(TransitionError::ZeroRoundDuration);
                }
                if let Some(new_duration) = round_duration {
                    if let TimerPhase::Paused { time_remaining } = self.phase {
                        let elapsed = self.round_duration.saturating_sub(time_remaining);
                        self.phase = TimerPhase::Paused {
                            time_remaining: new_duration.saturating_sub(elapsed),
                        };
                    }
                    self.round_duration = new_duration;
                }
                if let Some(break_duration) = break_duration {
                    self.break_duration = break_duration;
                }
            }
            (from, command) => {
                return Err(TransitionError::InvalidTransition {
                    from: from.status(),
                    command: command.name(),
                });
            }
        }
        Ok(outcome)
    }

    /// Leave the current round: the final round ends the event, any other opens a break.
    fn finish_round(&mut self) -> u32 {
        self.phase = if self.current_round >= self.final_round {
            TimerPhase::Ended
        } else {
            TimerPhase::BreakTime
        };
        self.current_round
    }
}

//! Explicit state container for one client session.
//!
//! Everything a screen needs lives here: the reconciled phase, the question
//! on display, the local answer, the countdowns, the roster and the winner.
//! Mutation only happens through [`SessionState::apply`] and the answer
//! helpers, so the whole thing can be driven from tests without a network.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::{
    error::ClientError,
    state::{
        countdown::{CountdownPurpose, CountdownTick, Countdowns},
        game::{
            AnswerSubmission, Choice, LeaderboardEntry, Participant, ParticipantId, Question,
            QuestionId,
        },
        roster::{Roster, RosterOrigin, RosterSnapshot, RosterSource},
        state_machine::{GameEvent, GamePhase, InvalidTransition, PhaseReconciler, Snapshot},
    },
};

/// Seconds allowed per question when the server does not say.
pub const DEFAULT_QUESTION_TIMER: u32 = 15;
/// Fixed length of the winner reveal.
pub const WINNER_REVEAL_SECONDS: u32 = 10;

/// Which side of the game this client plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Drives the game: opens registration, starts it, advances questions.
    Host,
    /// Registers and answers questions.
    #[default]
    Player,
}

impl Role {
    /// True for the host role.
    pub fn is_host(self) -> bool {
        matches!(self, Role::Host)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Host => f.write_str("host"),
            Role::Player => f.write_str("player"),
        }
    }
}

impl FromStr for Role {
    type Err = ClientError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "host" => Ok(Role::Host),
            "player" => Ok(Role::Player),
            other => Err(ClientError::InvalidInput(format!("unknown role `{other}`"))),
        }
    }
}

/// Follow-up actions requested by the session, fired at most once per trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Ask the backend for the first question (host only, pre-game countdown hit zero).
    StartFirstQuestion,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Phase before the event.
    pub from: GamePhase,
    /// Phase after the event.
    pub to: GamePhase,
    /// Effects the caller must execute.
    pub effects: Vec<Effect>,
}

impl Applied {
    /// Whether the phase changed.
    pub fn phase_changed(&self) -> bool {
        self.from != self.to
    }
}

/// One countdown tick and, on expiry, the result of reconciling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountdownOutcome {
    /// The decrement.
    pub tick: CountdownTick,
    /// Present when the tick reached zero.
    pub expiry: Option<Result<Applied, InvalidTransition>>,
}

/// Answer about to be sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSubmission {
    /// Registered participant answering.
    pub user_id: ParticipantId,
    /// Question being answered.
    pub question_id: QuestionId,
    /// Selected choice.
    pub choice: Choice,
}

/// Per-client game view.
#[derive(Debug, Clone)]
pub struct SessionState {
    role: Role,
    reconciler: PhaseReconciler,
    question: Option<Question>,
    answer: AnswerSubmission,
    countdowns: Countdowns,
    roster: RosterSource,
    winner: Option<String>,
    participant: Option<Participant>,
    host_confirmed: bool,
    connected: bool,
}

impl SessionState {
    /// Fresh idle session.
    pub fn new(role: Role) -> Self {
        Self {
            role,
            reconciler: PhaseReconciler::new(),
            question: None,
            answer: AnswerSubmission::Empty,
            countdowns: Countdowns::default(),
            roster: RosterSource::default(),
            winner: None,
            participant: None,
            host_confirmed: false,
            connected: false,
        }
    }

    /// Role of this client.
    pub fn role(&self) -> Role {
        self.role
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.reconciler.phase()
    }

    /// Phase and version.
    pub fn snapshot(&self) -> Snapshot {
        self.reconciler.snapshot()
    }

    /// Question on display.
    pub fn question(&self) -> Option<&Question> {
        self.question.as_ref()
    }

    /// Local answer state.
    pub fn answer(&self) -> AnswerSubmission {
        self.answer
    }

    /// Countdown values.
    pub fn countdowns(&self) -> &Countdowns {
        &self.countdowns
    }

    /// Merged roster.
    pub fn roster(&self) -> &Roster {
        self.roster.roster()
    }

    /// Winner name once the game finished.
    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    /// Participant registered from this client.
    pub fn participant(&self) -> Option<&Participant> {
        self.participant.as_ref()
    }

    /// Whether the backend confirmed the host announcement.
    pub fn host_confirmed(&self) -> bool {
        self.host_confirmed
    }

    /// Whether the push channel is currently open.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Record push channel state.
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    /// Remember the participant created by a successful registration.
    pub fn set_participant(&mut self, participant: Participant) {
        self.participant = Some(participant);
    }

    /// Merge a roster snapshot. Returns whether it was applied.
    pub fn apply_roster(&mut self, snapshot: RosterSnapshot) -> bool {
        self.roster.apply(snapshot)
    }

    /// Reconcile one event and update the derived payload.
    pub fn apply(&mut self, event: GameEvent, now: Instant) -> Result<Applied, InvalidTransition> {
        let from = self.reconciler.phase();
        let to = self.reconciler.apply(&event)?;
        let mut effects = Vec::new();

        match event {
            GameEvent::HostConfirmed => {
                self.host_confirmed = true;
            }
            GameEvent::Snapshot { .. } => {
                self.countdowns.clear_all(now);
            }
            GameEvent::RegistrationStarted => {
                self.question = None;
                self.answer = AnswerSubmission::Empty;
                self.winner = None;
            }
            GameEvent::GameStarted { countdown } => {
                self.question = None;
                self.answer = AnswerSubmission::Empty;
                self.winner = None;
                self.countdowns.clear_all(now);
                self.countdowns
                    .seed(CountdownPurpose::PreGame, countdown.unwrap_or(0), now);
            }
            GameEvent::NewQuestion { question, timer } => {
                self.question = Some(question);
                self.answer = AnswerSubmission::Empty;
                self.countdowns.seed(
                    CountdownPurpose::Question,
                    timer.filter(|seconds| *seconds > 0).unwrap_or(DEFAULT_QUESTION_TIMER),
                    now,
                );
            }
            GameEvent::GameFinished { leaderboard } => {
                let leaderboard = leaderboard.unwrap_or_default();
                self.winner = leaderboard
                    .first()
                    .map(|entry| entry.name.clone())
                    .or_else(|| self.roster().leader().map(|p| p.name.clone()));
                self.merge_leaderboard(&leaderboard, now);
                self.countdowns
                    .seed(CountdownPurpose::WinnerReveal, WINNER_REVEAL_SECONDS, now);
            }
            GameEvent::PreGameElapsed => {
                if self.role.is_host() {
                    effects.push(Effect::StartFirstQuestion);
                }
            }
            GameEvent::QuestionTimerElapsed | GameEvent::WinnerRevealElapsed => {}
        }
        self.countdowns.retain_phase(to, now);

        Ok(Applied { from, to, effects })
    }

    /// Earliest pending countdown decrement.
    pub fn next_countdown_deadline(&self) -> Option<Instant> {
        self.countdowns.next_deadline()
    }

    /// Apply the countdown decrements due at `now` and reconcile any expiry.
    pub fn advance_countdowns(&mut self, now: Instant) -> Vec<CountdownOutcome> {
        let ticks = self.countdowns.advance(now);
        ticks
            .into_iter()
            .map(|tick| {
                let expiry = tick.expired.then(|| {
                    let event = match tick.purpose {
                        CountdownPurpose::PreGame => GameEvent::PreGameElapsed,
                        CountdownPurpose::Question => GameEvent::QuestionTimerElapsed,
                        CountdownPurpose::WinnerReveal => GameEvent::WinnerRevealElapsed,
                    };
                    self.apply(event, now)
                });
                CountdownOutcome { tick, expiry }
            })
            .collect()
    }

    /// Record a locally selected choice for the active question.
    pub fn select_answer(&mut self, choice: Choice) -> Result<(), ClientError> {
        self.ensure_answerable()?;
        if self.answer.is_locked() {
            return Err(ClientError::AlreadySubmitted);
        }
        self.answer = AnswerSubmission::Selected(choice);
        Ok(())
    }

    /// Lock the selected answer for sending.
    pub fn begin_submit(&mut self) -> Result<PendingSubmission, ClientError> {
        let question_id = self.ensure_answerable()?;
        let user_id = self
            .participant
            .as_ref()
            .map(|p| p.id)
            .ok_or(ClientError::NotRegistered)?;

        let choice = match self.answer {
            AnswerSubmission::Empty => return Err(ClientError::NoAnswerSelected),
            AnswerSubmission::Selected(choice) => choice,
            AnswerSubmission::Submitting(_) | AnswerSubmission::Submitted { .. } => {
                return Err(ClientError::AlreadySubmitted);
            }
        };

        self.answer = AnswerSubmission::Submitting(choice);
        Ok(PendingSubmission {
            user_id,
            question_id,
            choice,
        })
    }

    /// Settle a submission started with [`begin_submit`](Self::begin_submit).
    ///
    /// `correct` is `None` when the request failed. Results for a question that
    /// has since been replaced are dropped. Returns whether the result was kept.
    pub fn finish_submit(&mut self, pending: PendingSubmission, correct: Option<bool>) -> bool {
        let same_question = self.question.as_ref().map(|q| q.id) == Some(pending.question_id);
        if !same_question || self.answer != AnswerSubmission::Submitting(pending.choice) {
            return false;
        }

        self.answer = match correct {
            Some(correct) => AnswerSubmission::Submitted {
                choice: pending.choice,
                correct,
            },
            None => AnswerSubmission::Selected(pending.choice),
        };
        true
    }

    fn ensure_answerable(&self) -> Result<QuestionId, ClientError> {
        match (self.phase(), self.question.as_ref()) {
            (GamePhase::QuestionActive | GamePhase::AwaitingNextQuestion, Some(question)) => {
                Ok(question.id)
            }
            _ => Err(ClientError::NoActiveQuestion),
        }
    }

    fn merge_leaderboard(&mut self, leaderboard: &[LeaderboardEntry], now: Instant) {
        if leaderboard.is_empty() {
            return;
        }
        let participants: Option<Vec<Participant>> = leaderboard
            .iter()
            .map(LeaderboardEntry::to_participant)
            .collect();
        if let Some(participants) = participants {
            self.roster.apply(RosterSnapshot {
                participants,
                observed_at: now,
                origin: RosterOrigin::Push,
            });
        }
    }
}

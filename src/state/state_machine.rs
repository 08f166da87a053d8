use thiserror::Error;

use crate::state::game::{LeaderboardEntry, Question};

/// Lifecycle phases as understood by a single client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GamePhase {
    /// Nothing is happening yet.
    Idle,
    /// Players may register.
    RegistrationOpen,
    /// The game was started and the pre-game countdown is running.
    CountdownToStart,
    /// A question is on screen and answers are accepted.
    QuestionActive,
    /// The question timer ran out (or the game is running without a known question).
    AwaitingNextQuestion,
    /// The winner is being revealed.
    WinnerReveal,
    /// The winner reveal is over.
    Finished,
}

impl GamePhase {
    /// Whether the roster should be polled while in this phase.
    pub fn polls_roster(self) -> bool {
        matches!(self, GamePhase::RegistrationOpen | GamePhase::QuestionActive)
    }
}

/// Inputs to the reconciler: server pushes plus local countdown expiries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The backend acknowledged the host announcement.
    HostConfirmed,
    /// Authoritative phase snapshot.
    Snapshot {
        /// Registration flag reported by the backend.
        registration_open: bool,
        /// Game-started flag reported by the backend.
        game_started: bool,
    },
    /// Registration was opened.
    RegistrationStarted,
    /// The game was started, optionally with a pre-game countdown.
    GameStarted {
        /// Seconds before the first question, when supplied.
        countdown: Option<u32>,
    },
    /// A new question replaces the current one.
    NewQuestion {
        /// The question to display.
        question: Question,
        /// Seconds allowed, when supplied.
        timer: Option<u32>,
    },
    /// The game finished, optionally with the final leaderboard.
    GameFinished {
        /// Leaderboard in server order.
        leaderboard: Option<Vec<LeaderboardEntry>>,
    },
    /// Local: the pre-game countdown reached zero.
    PreGameElapsed,
    /// Local: the question countdown reached zero.
    QuestionTimerElapsed,
    /// Local: the winner reveal countdown reached zero.
    WinnerRevealElapsed,
}

impl GameEvent {
    /// Whether the event originates from a local countdown rather than the server.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            GameEvent::PreGameElapsed
                | GameEvent::QuestionTimerElapsed
                | GameEvent::WinnerRevealElapsed
        )
    }
}

/// Returned when a local event no longer applies to the current phase.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid transition: {event:?} cannot be applied while in {from:?}")]
pub struct InvalidTransition {
    /// Phase the reconciler was in.
    pub from: GamePhase,
    /// The rejected event.
    pub event: GameEvent,
}

/// Snapshot of the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Number of events applied so far.
    pub version: usize,
}

/// Compute the next phase for `event` from `from`.
///
/// Server events are always accepted (last write wins). Local expiries only
/// apply to the phase that seeded them.
pub fn reconcile(from: GamePhase, event: &GameEvent) -> Result<GamePhase, InvalidTransition> {
    let next = match (from, event) {
        (phase, GameEvent::HostConfirmed) => phase,
        (
            _,
            GameEvent::Snapshot {
                registration_open,
                game_started,
            },
        ) => {
            if *game_started {
                GamePhase::AwaitingNextQuestion
            } else if *registration_open {
                GamePhase::RegistrationOpen
            } else {
                GamePhase::Idle
            }
        }
        (_, GameEvent::RegistrationStarted) => GamePhase::RegistrationOpen,
        (_, GameEvent::GameStarted { .. }) => GamePhase::CountdownToStart,
        (_, GameEvent::NewQuestion { .. }) => GamePhase::QuestionActive,
        (_, GameEvent::GameFinished { .. }) => GamePhase::WinnerReveal,
        (GamePhase::CountdownToStart, GameEvent::PreGameElapsed) => GamePhase::CountdownToStart,
        (GamePhase::QuestionActive, GameEvent::QuestionTimerElapsed) => {
            GamePhase::AwaitingNextQuestion
        }
        (GamePhase::WinnerReveal, GameEvent::WinnerRevealElapsed) => GamePhase::Finished,
        (from, event) => {
            return Err(InvalidTransition {
                from,
                event: event.clone(),
            });
        }
    };

    Ok(next)
}

/// Holds the authoritative phase for one client and counts applied events.
#[derive(Debug, Clone)]
pub struct PhaseReconciler {
    phase: GamePhase,
    version: usize,
}

impl Default for PhaseReconciler {
    fn default() -> Self {
        Self {
            phase: GamePhase::Idle,
            version: 0,
        }
    }
}

impl PhaseReconciler {
    /// Create a reconciler starting in [`GamePhase::Idle`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the current phase.
    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Create a snapshot of the current state.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            version: self.version,
        }
    }

    /// Apply an event, returning the new phase.
    pub fn apply(&mut self, event: &GameEvent) -> Result<GamePhase, InvalidTransition> {
        let next = reconcile(self.phase, event)?;
        self.phase = next;
        self.version += 1;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(id: u64) -> Question {
        Question {
            id,
            prompt: format!("question {id}"),
            choices: ["a".into(), "b".into(), "c".into(), "d".into()],
        }
    }

    fn replay(events: &[GameEvent]) -> Vec<GamePhase> {
        let mut reconciler = PhaseReconciler::new();
        events
            .iter()
            .filter_map(|event| reconciler.apply(event).ok())
            .collect()
    }

    #[test]
    fn initial_state_is_idle() {
        let reconciler = PhaseReconciler::new();
        assert_eq!(reconciler.phase(), GamePhase::Idle);
        assert_eq!(reconciler.snapshot().version, 0);
    }

    #[test]
    fn full_happy_path_through_game() {
        let phases = replay(&[
            GameEvent::HostConfirmed,
            GameEvent::RegistrationStarted,
            GameEvent::GameStarted { countdown: Some(5) },
            GameEvent::PreGameElapsed,
            GameEvent::NewQuestion {
                question: question(1),
                timer: Some(15),
            },
            GameEvent::QuestionTimerElapsed,
            GameEvent::NewQuestion {
                question: question(2),
                timer: None,
            },
            GameEvent::GameFinished { leaderboard: None },
            GameEvent::WinnerRevealElapsed,
        ]);

        assert_eq!(
            phases,
            vec![
                GamePhase::Idle,
                GamePhase::RegistrationOpen,
                GamePhase::CountdownToStart,
                GamePhase::CountdownToStart,
                GamePhase::QuestionActive,
                GamePhase::AwaitingNextQuestion,
                GamePhase::QuestionActive,
                GamePhase::WinnerReveal,
                GamePhase::Finished,
            ]
        );
    }

    #[test]
    fn snapshot_precedence_prefers_game_started() {
        let cases = [
            (true, true, GamePhase::AwaitingNextQuestion),
            (false, true, GamePhase::AwaitingNextQuestion),
            (true, false, GamePhase::RegistrationOpen),
            (false, false, GamePhase::Idle),
        ];

        for (registration_open, game_started, expected) in cases {
            let event = GameEvent::Snapshot {
                registration_open,
                game_started,
            };
            for from in [GamePhase::Idle, GamePhase::QuestionActive, GamePhase::Finished] {
                assert_eq!(reconcile(from, &event), Ok(expected));
            }
        }
    }

    #[test]
    fn replaying_the_same_events_is_deterministic() {
        let events = vec![
            GameEvent::GameStarted { countdown: None },
            GameEvent::RegistrationStarted,
            GameEvent::NewQuestion {
                question: question(3),
                timer: Some(4),
            },
            GameEvent::WinnerRevealElapsed,
            GameEvent::Snapshot {
                registration_open: true,
                game_started: false,
            },
            GameEvent::GameFinished { leaderboard: None },
        ];

        assert_eq!(replay(&events), replay(&events));
    }

    #[test]
    fn out_of_order_events_follow_last_write() {
        let phases = replay(&[
            GameEvent::NewQuestion {
                question: question(1),
                timer: None,
            },
            GameEvent::RegistrationStarted,
        ]);
        assert_eq!(phases.last(), Some(&GamePhase::RegistrationOpen));
    }

    #[test]
    fn stale_local_expiry_is_rejected() {
        let mut reconciler = PhaseReconciler::new();
        reconciler.apply(&GameEvent::RegistrationStarted).unwrap();

        let err = reconciler
            .apply(&GameEvent::WinnerRevealElapsed)
            .unwrap_err();
        assert_eq!(err.from, GamePhase::RegistrationOpen);
        assert_eq!(err.event, GameEvent::WinnerRevealElapsed);
        assert_eq!(reconciler.phase(), GamePhase::RegistrationOpen);
        assert_eq!(reconciler.snapshot().version, 1);
    }

    #[test]
    fn pre_game_expiry_never_starts_a_question() {
        assert_eq!(
            reconcile(GamePhase::CountdownToStart, &GameEvent::PreGameElapsed),
            Ok(GamePhase::CountdownToStart)
        );
    }

    #[test]
    fn roster_polling_phases() {
        let polling: Vec<_> = [
            GamePhase::Idle,
            GamePhase::RegistrationOpen,
            GamePhase::CountdownToStart,
            GamePhase::QuestionActive,
            GamePhase::AwaitingNextQuestion,
            GamePhase::WinnerReveal,
            GamePhase::Finished,
        ]
        .into_iter()
        .filter(|phase| phase.polls_roster())
        .collect();

        assert_eq!(
            polling,
            vec![GamePhase::RegistrationOpen, GamePhase::QuestionActive]
        );
    }
}

use serde::Serialize;

use crate::state::state_machine::GamePhase;

/// Game phase as rendered to the user.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisibleGamePhase {
    /// Waiting for the host to open registration.
    Idle,
    /// Registration is open.
    Registration,
    /// Game starting soon.
    Countdown,
    /// A question is accepting answers.
    Question,
    /// Time is up; waiting for the host to move on.
    Waiting,
    /// Announcing the winner.
    Winner,
    /// Game over.
    Finished,
}

impl From<GamePhase> for VisibleGamePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Idle => VisibleGamePhase::Idle,
            GamePhase::RegistrationOpen => VisibleGamePhase::Registration,
            GamePhase::CountdownToStart => VisibleGamePhase::Countdown,
            GamePhase::QuestionActive => VisibleGamePhase::Question,
            GamePhase::AwaitingNextQuestion => VisibleGamePhase::Waiting,
            GamePhase::WinnerReveal => VisibleGamePhase::Winner,
            GamePhase::Finished => VisibleGamePhase::Finished,
        }
    }
}

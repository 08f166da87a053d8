use serde::{Deserialize, Serialize};

use crate::state::{
    game::{LeaderboardEntry, Question},
    state_machine::GameEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
/// Messages sent to the backend over the push channel.
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Announce this connection as the host.
    HostConnect,
    /// Ask for a `game_state` snapshot.
    GetGameState,
}

#[derive(Debug, Clone, Deserialize)]
/// Messages pushed by the backend.
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "host_confirmed")]
    HostConfirmed {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "game_state")]
    GameState { state: GameStateFlags },
    #[serde(rename = "registration_started")]
    RegistrationStarted {
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "game_started")]
    GameStarted {
        #[serde(default)]
        countdown: Option<u32>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(rename = "new_question")]
    NewQuestion {
        question: QuestionPayload,
        #[serde(default)]
        timer: Option<u32>,
    },
    #[serde(rename = "game_finished")]
    GameFinished {
        #[serde(default)]
        leaderboard: Option<Vec<LeaderboardEntryPayload>>,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Parse a text frame.
    pub fn from_json_str(payload: &str) -> serde_json::Result<Self> {
        serde_json::from_str(payload)
    }

    /// Map onto a reconciler event; `None` for tags this client does not know.
    pub fn into_event(self) -> Option<GameEvent> {
        let event = match self {
            ServerMessage::HostConfirmed { .. } => GameEvent::HostConfirmed,
            ServerMessage::GameState { state } => GameEvent::Snapshot {
                registration_open: state.is_registration_open,
                game_started: state.is_game_started,
            },
            ServerMessage::RegistrationStarted { .. } => GameEvent::RegistrationStarted,
            ServerMessage::GameStarted { countdown, .. } => GameEvent::GameStarted { countdown },
            ServerMessage::NewQuestion { question, timer } => GameEvent::NewQuestion {
                question: question.into(),
                timer,
            },
            ServerMessage::GameFinished { leaderboard } => GameEvent::GameFinished {
                leaderboard: leaderboard
                    .map(|entries| entries.into_iter().map(Into::into).collect()),
            },
            ServerMessage::Unknown => return None,
        };
        Some(event)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
/// Subset of the backend game state used to derive the phase.
pub struct GameStateFlags {
    #[serde(default)]
    pub is_registration_open: bool,
    #[serde(default)]
    pub is_game_started: bool,
}

#[derive(Debug, Clone, Deserialize)]
/// Question as serialized by the backend.
pub struct QuestionPayload {
    pub id: u64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
}

impl From<QuestionPayload> for Question {
    fn from(value: QuestionPayload) -> Self {
        Self {
            id: value.id,
            prompt: value.question_text,
            choices: [value.option_a, value.option_b, value.option_c, value.option_d],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
/// Leaderboard row pushed with `game_finished`.
pub struct LeaderboardEntryPayload {
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub score: i64,
    #[serde(default)]
    pub is_host: bool,
}

impl From<LeaderboardEntryPayload> for LeaderboardEntry {
    fn from(value: LeaderboardEntryPayload) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            is_host: value.is_host,
        }
    }
}

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier assigned by the backend to a registered participant.
pub type ParticipantId = u64;
/// Identifier assigned by the backend to a trivia question.
pub type QuestionId = u64;

/// One of the four labelled answer choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// First choice.
    A,
    /// Second choice.
    B,
    /// Third choice.
    C,
    /// Fourth choice.
    D,
}

impl Choice {
    /// All choices in display order.
    pub const ALL: [Choice; 4] = [Choice::A, Choice::B, Choice::C, Choice::D];

    /// Letter sent to the backend when submitting an answer.
    pub fn letter(self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::C => "C",
            Choice::D => "D",
        }
    }

    fn index(self) -> usize {
        match self {
            Choice::A => 0,
            Choice::B => 1,
            Choice::C => 2,
            Choice::D => 3,
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// Error returned when a string is not one of the four choice letters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{0}` is not a valid choice (expected A, B, C or D)")]
pub struct InvalidChoice(pub String);

impl FromStr for Choice {
    type Err = InvalidChoice;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Choice::A),
            "B" => Ok(Choice::B),
            "C" => Ok(Choice::C),
            "D" => Ok(Choice::D),
            _ => Err(InvalidChoice(value.to_string())),
        }
    }
}

/// Question currently on screen. Replaced wholesale on every new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Backend identifier, echoed back when submitting an answer.
    pub id: QuestionId,
    /// Prompt text.
    pub prompt: String,
    /// Choice texts indexed A..D.
    pub choices: [String; 4],
}

impl Question {
    /// Text of the given choice.
    pub fn choice_text(&self, choice: Choice) -> &str {
        &self.choices[choice.index()]
    }
}

/// Registered participant as last reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Backend identifier; unique within a roster.
    pub id: ParticipantId,
    /// Display name chosen at registration.
    pub name: String,
    /// Cumulative score. Only ever set from server data.
    pub score: i64,
    /// Whether the participant registered as the host.
    pub is_host: bool,
}

/// Entry of a leaderboard pushed with the `game_finished` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    /// Participant identifier when the backend includes it.
    pub id: Option<ParticipantId>,
    /// Display name.
    pub name: String,
    /// Final score.
    pub score: i64,
    /// Host flag, `false` when omitted.
    pub is_host: bool,
}

impl LeaderboardEntry {
    /// Convert into a roster participant when the backend supplied an identifier.
    pub fn to_participant(&self) -> Option<Participant> {
        self.id.map(|id| Participant {
            id,
            name: self.name.clone(),
            score: self.score,
            is_host: self.is_host,
        })
    }
}

/// Client-local answer for the active question.
///
/// `Submitted` doubles as the result-display state: it carries the correctness
/// reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnswerSubmission {
    /// Nothing selected yet.
    #[default]
    Empty,
    /// A choice is selected but not sent.
    Selected(Choice),
    /// The choice is being sent; further submits are rejected.
    Submitting(Choice),
    /// The backend accepted the answer. Immutable until the next question.
    Submitted {
        /// Submitted choice.
        choice: Choice,
        /// Whether the backend judged it correct.
        correct: bool,
    },
}

impl AnswerSubmission {
    /// Currently selected or submitted choice, if any.
    pub fn choice(&self) -> Option<Choice> {
        match *self {
            AnswerSubmission::Empty => None,
            AnswerSubmission::Selected(choice) | AnswerSubmission::Submitting(choice) => {
                Some(choice)
            }
            AnswerSubmission::Submitted { choice, .. } => Some(choice),
        }
    }

    /// True once a submission is in flight or accepted.
    pub fn is_locked(&self) -> bool {
        matches!(
            self,
            AnswerSubmission::Submitting(_) | AnswerSubmission::Submitted { .. }
        )
    }

    /// Correctness to display, present only after a successful submit.
    pub fn result(&self) -> Option<bool> {
        match self {
            AnswerSubmission::Submitted { correct, .. } => Some(*correct),
            _ => None,
        }
    }
}

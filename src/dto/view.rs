//! Read-only rendering of a session, used by the `status` command and in logs.

use serde::Serialize;

use crate::{
    dto::phase::VisibleGamePhase,
    state::{
        Role, SessionState,
        countdown::CountdownPurpose,
        game::{AnswerSubmission, Choice, Participant, ParticipantId, Question, QuestionId},
    },
};

/// Everything a screen would show for one client.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub role: Role,
    pub phase: VisibleGamePhase,
    pub version: usize,
    pub connected: bool,
    pub host_confirmed: bool,
    pub participant: Option<ParticipantView>,
    pub question: Option<QuestionView>,
    pub answer: AnswerView,
    pub countdowns: CountdownsView,
    pub leaderboard: Vec<ParticipantView>,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantView {
    pub id: ParticipantId,
    pub name: String,
    pub score: i64,
    pub is_host: bool,
}

impl From<&Participant> for ParticipantView {
    fn from(value: &Participant) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            score: value.score,
            is_host: value.is_host,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: QuestionId,
    pub prompt: String,
    pub choices: Vec<ChoiceView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChoiceView {
    pub letter: Choice,
    pub text: String,
}

impl From<&Question> for QuestionView {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id,
            prompt: value.prompt.clone(),
            choices: Choice::ALL
                .into_iter()
                .map(|letter| ChoiceView {
                    letter,
                    text: value.choice_text(letter).to_string(),
                })
                .collect(),
        }
    }
}

/// Local answer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnswerView {
    Empty,
    Selected { choice: Choice },
    Submitting { choice: Choice },
    Submitted { choice: Choice, correct: bool },
}

impl From<AnswerSubmission> for AnswerView {
    fn from(value: AnswerSubmission) -> Self {
        match value {
            AnswerSubmission::Empty => AnswerView::Empty,
            AnswerSubmission::Selected(choice) => AnswerView::Selected { choice },
            AnswerSubmission::Submitting(choice) => AnswerView::Submitting { choice },
            AnswerSubmission::Submitted { choice, correct } => {
                AnswerView::Submitted { choice, correct }
            }
        }
    }
}

/// Seconds left on each countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CountdownsView {
    pub pre_game: u32,
    pub question: u32,
    pub winner_reveal: u32,
}

impl From<&SessionState> for SessionView {
    fn from(session: &SessionState) -> Self {
        let snapshot = session.snapshot();
        let countdowns = session.countdowns();
        Self {
            role: session.role(),
            phase: snapshot.phase.into(),
            version: snapshot.version,
            connected: session.connected(),
            host_confirmed: session.host_confirmed(),
            participant: session.participant().map(Into::into),
            question: session.question().map(Into::into),
            answer: session.answer().into(),
            countdowns: CountdownsView {
                pre_game: countdowns.remaining(CountdownPurpose::PreGame),
                question: countdowns.remaining(CountdownPurpose::Question),
                winner_reveal: countdowns.remaining(CountdownPurpose::WinnerReveal),
            },
            leaderboard: session
                .roster()
                .leaderboard()
                .into_iter()
                .map(Into::into)
                .collect(),
            winner: session.winner().map(str::to_string),
        }
    }
}

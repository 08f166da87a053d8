use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::error::ApiError, state::game::InvalidChoice};

/// Errors surfaced to the user by the dispatcher and the session.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Input rejected before any request was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The action needs a registered participant.
    #[error("not registered")]
    NotRegistered,
    /// No question is on display.
    #[error("no active question")]
    NoActiveQuestion,
    /// Submit was requested before selecting a choice.
    #[error("no answer selected")]
    NoAnswerSelected,
    /// An answer for this question is in flight or already accepted.
    #[error("answer already submitted")]
    AlreadySubmitted,
    /// Host-only action attempted by a player.
    #[error("only the host can do that")]
    NotHost,
    /// The backend request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<ValidationErrors> for ClientError {
    fn from(err: ValidationErrors) -> Self {
        ClientError::InvalidInput(format!("validation failed: {}", err))
    }
}

impl From<InvalidChoice> for ClientError {
    fn from(err: InvalidChoice) -> Self {
        ClientError::InvalidInput(err.to_string())
    }
}

impl ClientError {
    /// Whether retrying the same action later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Api(err) => err.is_retryable(),
            _ => false,
        }
    }
}

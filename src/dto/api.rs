use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

use crate::{
    dao::error::{ApiError, ApiResult},
    dto::validation::validate_display_name,
    state::game::{Choice, Participant, ParticipantId, QuestionId},
};

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    #[serde(default)]
    pub is_host: bool,
}

impl RegisterRequest {
    /// Build a request with surrounding whitespace stripped from the name.
    pub fn new(name: &str, is_host: bool) -> Self {
        Self {
            name: name.trim().to_string(),
            is_host,
        }
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_display_name(&self.name) {
            errors.add("name", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Participant as returned by `/register` and `/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: ParticipantId,
    pub name: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub is_host: bool,
}

impl From<UserResponse> for Participant {
    fn from(value: UserResponse) -> Self {
        Self {
            id: value.id,
            name: value.name,
            score: value.score,
            is_host: value.is_host,
        }
    }
}

/// Body of `POST /submit-answer`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub user_id: ParticipantId,
    pub question_id: QuestionId,
    pub selected_answer: Choice,
}

/// Result of `POST /submit-answer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub correct: bool,
    #[serde(default)]
    pub score: i64,
}

/// Body returned by the host control endpoints.
///
/// The backend reports some refusals with a success status and an `error` field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActionResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ActionResponse {
    /// Turn an in-band `error` into [`ApiError::Rejected`].
    pub fn into_result(self, path: &str) -> ApiResult<Option<String>> {
        match self.error {
            Some(message) => Err(ApiError::Rejected {
                path: path.to_string(),
                message,
            }),
            None => Ok(self.message),
        }
    }
}

/// FastAPI-style error body: `{"detail": ...}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub detail: serde_json::Value,
}

impl ErrorBody {
    /// Human readable detail; validation error lists are rendered as JSON.
    pub fn detail_text(&self) -> String {
        match &self.detail {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

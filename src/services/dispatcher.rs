//! User actions: one request/response call each, state touched only on success.

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::{error::ApiResult, game_api::GameApi},
    dto::api::{AnswerResponse, RegisterRequest, SubmitAnswerRequest},
    error::ClientError,
    state::{
        SharedState,
        game::{Choice, Participant},
    },
};

/// Host control endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostAction {
    StartRegistration,
    StartGame,
    StartFirstQuestion,
    NextQuestion,
}

impl HostAction {
    fn name(self) -> &'static str {
        match self {
            HostAction::StartRegistration => "start-registration",
            HostAction::StartGame => "start-game",
            HostAction::StartFirstQuestion => "start-first-question",
            HostAction::NextQuestion => "next-question",
        }
    }
}

/// Issues user actions against the backend and records their outcome in the session.
#[derive(Clone)]
pub struct ActionDispatcher {
    state: SharedState,
    api: Arc<dyn GameApi>,
}

impl ActionDispatcher {
    pub fn new(state: SharedState, api: Arc<dyn GameApi>) -> Self {
        Self { state, api }
    }

    /// Shared state this dispatcher writes to.
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Register a participant and remember it as this client's identity.
    pub async fn register(&self, name: &str) -> Result<Participant, ClientError> {
        let request = RegisterRequest::new(name, self.state.role().is_host());
        request.validate()?;

        match self.api.register(request).await {
            Ok(participant) => {
                info!(id = participant.id, name = %participant.name, "registered");
                self.state
                    .with_session_mut(|session| session.set_participant(participant.clone()))
                    .await;
                Ok(participant)
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                Err(err.into())
            }
        }
    }

    /// Record a choice for the active question. Local only.
    pub async fn select_answer(&self, choice: Choice) -> Result<(), ClientError> {
        self.state
            .with_session_mut(|session| session.select_answer(choice))
            .await?;
        debug!(%choice, "answer selected");
        Ok(())
    }

    /// Send the selected answer. Rejected locally while one is in flight or accepted.
    pub async fn submit_answer(&self) -> Result<AnswerResponse, ClientError> {
        let pending = self
            .state
            .with_session_mut(|session| session.begin_submit())
            .await?;

        let request = SubmitAnswerRequest {
            user_id: pending.user_id,
            question_id: pending.question_id,
            selected_answer: pending.choice,
        };
        let result = self.api.submit_answer(request).await;

        let correct = result.as_ref().ok().map(|response| response.correct);
        let kept = self
            .state
            .with_session_mut(|session| {
                let kept = session.finish_submit(pending, correct);
                if let (true, Ok(response)) = (kept, &result) {
                    if let Some(mut participant) = session.participant().cloned() {
                        participant.score = response.score;
                        session.set_participant(participant);
                    }
                }
                kept
            })
            .await;

        match result {
            Ok(response) => {
                info!(
                    question = pending.question_id,
                    choice = %pending.choice,
                    correct = response.correct,
                    score = response.score,
                    "answer submitted"
                );
                if !kept {
                    debug!(question = pending.question_id, "question changed; result discarded");
                }
                Ok(response)
            }
            Err(err) => {
                warn!(question = pending.question_id, error = %err, "answer submission failed");
                Err(err.into())
            }
        }
    }

    /// Open registration (host only).
    pub async fn start_registration(&self) -> Result<Option<String>, ClientError> {
        self.host_action(HostAction::StartRegistration).await
    }

    /// Start the game (host only).
    pub async fn start_game(&self) -> Result<Option<String>, ClientError> {
        self.host_action(HostAction::StartGame).await
    }

    /// Show the first question (host only).
    pub async fn start_first_question(&self) -> Result<Option<String>, ClientError> {
        self.host_action(HostAction::StartFirstQuestion).await
    }

    /// Advance to the next question, or finish the game (host only).
    pub async fn next_question(&self) -> Result<Option<String>, ClientError> {
        self.host_action(HostAction::NextQuestion).await
    }

    /// Run a host control call. The resulting phase change arrives over the push channel.
    pub async fn host_action(&self, action: HostAction) -> Result<Option<String>, ClientError> {
        if !self.state.role().is_host() {
            return Err(ClientError::NotHost);
        }

        let result: ApiResult<Option<String>> = match action {
            HostAction::StartRegistration => self.api.start_registration().await,
            HostAction::StartGame => self.api.start_game().await,
            HostAction::StartFirstQuestion => self.api.start_first_question().await,
            HostAction::NextQuestion => self.api.next_question().await,
        };

        match result {
            Ok(message) => {
                info!(action = action.name(), message = ?message, "host action accepted");
                Ok(message)
            }
            Err(err) => {
                warn!(action = action.name(), error = %err, "host action failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::{
        dao::{
            error::ApiError,
            game_api::mock::{Call, MockGameApi},
        },
        state::{
            ClientState, Role,
            game::{AnswerSubmission, Question},
            state_machine::GameEvent,
        },
    };

    fn dispatcher(role: Role) -> (ActionDispatcher, MockGameApi) {
        let api = MockGameApi::new();
        let dispatcher = ActionDispatcher::new(ClientState::new(role), Arc::new(api.clone()));
        (dispatcher, api)
    }

    async fn show_question(dispatcher: &ActionDispatcher, id: u64) {
        dispatcher
            .state()
            .with_session_mut(|session| {
                session.apply(
                    GameEvent::NewQuestion {
                        question: Question {
                            id,
                            prompt: "2 + 2?".into(),
                            choices: ["3".into(), "4".into(), "5".into(), "22".into()],
                        },
                        timer: Some(15),
                    },
                    Instant::now(),
                )
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn register_validates_before_calling_backend() {
        let (dispatcher, api) = dispatcher(Role::Player);

        let err = dispatcher.register("   ").await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidInput(_)));
        assert!(api.calls().is_empty());

        let participant = dispatcher.register(" Ana ").await.unwrap();
        assert_eq!(participant.name, "Ana");
        assert_eq!(
            api.calls(),
            vec![Call::Register(RegisterRequest {
                name: "Ana".into(),
                is_host: false,
            })]
        );
        let stored = dispatcher
            .state()
            .read_session(|session| session.participant().cloned())
            .await;
        assert_eq!(stored, Some(participant));
    }

    #[tokio::test]
    async fn failed_registration_leaves_state_unchanged() {
        let (dispatcher, api) = dispatcher(Role::Player);
        api.fail_next(ApiError::Status {
            path: "/register".into(),
            status: 403,
            detail: Some("Registration is closed".into()),
        });

        let err = dispatcher.register("Ana").await.unwrap_err();
        assert!(matches!(err, ClientError::Api(ApiError::Status { status: 403, .. })));
        let stored = dispatcher
            .state()
            .read_session(|session| session.participant().cloned())
            .await;
        assert!(stored.is_none());
    }

    #[tokio::test]
    async fn submit_records_correctness_and_blocks_resubmission() {
        let (dispatcher, api) = dispatcher(Role::Player);
        api.set_answer(AnswerResponse {
            correct: true,
            score: 10,
        });
        dispatcher.register("Ana").await.unwrap();
        show_question(&dispatcher, 3).await;

        dispatcher.select_answer(Choice::B).await.unwrap();
        let response = dispatcher.submit_answer().await.unwrap();
        assert!(response.correct);

        let (answer, score) = dispatcher
            .state()
            .read_session(|session| (session.answer(), session.participant().map(|p| p.score)))
            .await;
        assert_eq!(
            answer,
            AnswerSubmission::Submitted {
                choice: Choice::B,
                correct: true,
            }
        );
        assert_eq!(score, Some(10));

        let err = dispatcher.submit_answer().await.unwrap_err();
        assert!(matches!(err, ClientError::AlreadySubmitted));
        let submits = api
            .calls()
            .into_iter()
            .filter(|call| matches!(call, Call::SubmitAnswer(_)))
            .count();
        assert_eq!(submits, 1);
    }

    #[tokio::test]
    async fn failed_submit_can_be_retried() {
        let (dispatcher, api) = dispatcher(Role::Player);
        dispatcher.register("Ana").await.unwrap();
        show_question(&dispatcher, 3).await;
        dispatcher.select_answer(Choice::D).await.unwrap();

        api.fail_next(ApiError::Status {
            path: "/submit-answer".into(),
            status: 400,
            detail: Some("No active question".into()),
        });
        assert!(dispatcher.submit_answer().await.is_err());
        let answer = dispatcher.state().read_session(|session| session.answer()).await;
        assert_eq!(answer, AnswerSubmission::Selected(Choice::D));

        assert!(dispatcher.submit_answer().await.is_ok());
    }

    #[tokio::test]
    async fn host_actions_require_host_role() {
        let (player, api) = dispatcher(Role::Player);
        assert!(matches!(
            player.start_game().await,
            Err(ClientError::NotHost)
        ));
        assert!(api.calls().is_empty());

        let (host, api) = dispatcher(Role::Host);
        host.start_registration().await.unwrap();
        host.start_game().await.unwrap();
        host.start_first_question().await.unwrap();
        host.next_question().await.unwrap();
        assert_eq!(
            api.calls(),
            vec![
                Call::StartRegistration,
                Call::StartGame,
                Call::StartFirstQuestion,
                Call::NextQuestion,
            ]
        );
    }

    #[tokio::test]
    async fn host_action_does_not_change_phase_locally() {
        let (host, _api) = dispatcher(Role::Host);
        host.start_registration().await.unwrap();
        assert_eq!(
            host.state().phase().await,
            crate::state::state_machine::GamePhase::Idle
        );
    }
}

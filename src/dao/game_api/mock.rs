//! In-memory [`GameApi`] used by unit tests.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use crate::{
    dao::{
        error::{ApiError, ApiResult},
        game_api::GameApi,
    },
    dto::api::{AnswerResponse, RegisterRequest, SubmitAnswerRequest},
    state::game::Participant,
};

/// Calls recorded by [`MockGameApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    StartRegistration,
    StartGame,
    StartFirstQuestion,
    NextQuestion,
    ListUsers,
    Register(RegisterRequest),
    SubmitAnswer(SubmitAnswerRequest),
}

#[derive(Default)]
struct Inner {
    calls: Vec<Call>,
    users: Vec<Participant>,
    next_id: u64,
    fail_next: Option<ApiError>,
    answer: Option<AnswerResponse>,
}

/// Records calls and answers with canned data.
#[derive(Clone, Default)]
pub struct MockGameApi {
    inner: Arc<Mutex<Inner>>,
}

impl MockGameApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    /// Roster returned by `list_users`.
    pub fn set_users(&self, users: Vec<Participant>) {
        self.inner.lock().unwrap().users = users;
    }

    /// Result returned by `submit_answer`.
    pub fn set_answer(&self, answer: AnswerResponse) {
        self.inner.lock().unwrap().answer = Some(answer);
    }

    /// Make the next call fail with `err`.
    pub fn fail_next(&self, err: ApiError) {
        self.inner.lock().unwrap().fail_next = Some(err);
    }

    fn record(&self, call: Call) -> ApiResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.calls.push(call);
        match inner.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn action(&self, call: Call) -> BoxFuture<'static, ApiResult<Option<String>>> {
        let result = self.record(call).map(|()| Some("ok".to_string()));
        Box::pin(async move { result })
    }
}

impl GameApi for MockGameApi {
    fn start_registration(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        self.action(Call::StartRegistration)
    }

    fn start_game(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        self.action(Call::StartGame)
    }

    fn start_first_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        self.action(Call::StartFirstQuestion)
    }

    fn next_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        self.action(Call::NextQuestion)
    }

    fn list_users(&self) -> BoxFuture<'static, ApiResult<Vec<Participant>>> {
        let result = self
            .record(Call::ListUsers)
            .map(|()| self.inner.lock().unwrap().users.clone());
        Box::pin(async move { result })
    }

    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, ApiResult<Participant>> {
        let result = self.record(Call::Register(request.clone())).map(|()| {
            let mut inner = self.inner.lock().unwrap();
            inner.next_id += 1;
            let participant = Participant {
                id: inner.next_id,
                name: request.name,
                score: 0,
                is_host: request.is_host,
            };
            inner.users.push(participant.clone());
            participant
        });
        Box::pin(async move { result })
    }

    fn submit_answer(
        &self,
        request: SubmitAnswerRequest,
    ) -> BoxFuture<'static, ApiResult<AnswerResponse>> {
        let result = self.record(Call::SubmitAnswer(request)).map(|()| {
            self.inner
                .lock()
                .unwrap()
                .answer
                .unwrap_or(AnswerResponse {
                    correct: false,
                    score: 0,
                })
        });
        Box::pin(async move { result })
    }
}

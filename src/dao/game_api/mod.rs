/// HTTP implementation of [`GameApi`].
pub mod http;
#[cfg(test)]
pub mod mock;

use futures::future::BoxFuture;

use crate::{
    dao::error::ApiResult,
    dto::api::{AnswerResponse, RegisterRequest, SubmitAnswerRequest},
    state::game::Participant,
};

/// Abstraction over the trivia backend's request/response endpoints.
///
/// Host control calls resolve to the backend's acknowledgement message, if any.
pub trait GameApi: Send + Sync {
    fn start_registration(&self) -> BoxFuture<'static, ApiResult<Option<String>>>;
    fn start_game(&self) -> BoxFuture<'static, ApiResult<Option<String>>>;
    fn start_first_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>>;
    fn next_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>>;
    fn list_users(&self) -> BoxFuture<'static, ApiResult<Vec<Participant>>>;
    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, ApiResult<Participant>>;
    fn submit_answer(
        &self,
        request: SubmitAnswerRequest,
    ) -> BoxFuture<'static, ApiResult<AnswerResponse>>;
}

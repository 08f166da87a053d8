use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    dao::{error::ApiResult, game_api::GameApi},
    dto::api::{
        ActionResponse, AnswerResponse, ErrorBody, RegisterRequest, SubmitAnswerRequest,
        UserResponse,
    },
    state::game::Participant,
};

use super::{
    config::HttpApiConfig,
    error::{HttpApiError, HttpResult},
};

const START_REGISTRATION: &str = "/start-registration";
const START_GAME: &str = "/start-game";
const START_FIRST_QUESTION: &str = "/start-first-question";
const NEXT_QUESTION: &str = "/next-question";
const USERS: &str = "/users";
const REGISTER: &str = "/register";
const SUBMIT_ANSWER: &str = "/submit-answer";

/// [`GameApi`] backed by the trivia backend's REST endpoints.
#[derive(Clone)]
pub struct HttpGameApi {
    client: Client,
    base_url: Arc<str>,
}

impl HttpGameApi {
    /// Build a client for the configured backend.
    pub fn new(config: HttpApiConfig) -> HttpResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|source| HttpApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(config.base_url.trim_end_matches('/')),
        })
    }

    /// Base URL every path is resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url)
    }

    async fn send(&self, builder: reqwest::RequestBuilder, path: &str) -> HttpResult<Response> {
        let response = builder
            .send()
            .await
            .map_err(|source| HttpApiError::RequestSend {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .map(|body| body.detail_text());
        Err(HttpApiError::RequestStatus {
            path: path.to_string(),
            status,
            detail,
        })
    }

    async fn decode<T>(response: Response, path: &str) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        response
            .json::<T>()
            .await
            .map_err(|source| HttpApiError::DecodeResponse {
                path: path.to_string(),
                source,
            })
    }

    async fn post_action(&self, path: &'static str) -> ApiResult<Option<String>> {
        let response = self.send(self.request(Method::POST, path), path).await?;
        let body = Self::decode::<ActionResponse>(response, path).await?;
        let message = body.into_result(path)?;
        debug!(path, message = ?message, "backend acknowledged action");
        Ok(message)
    }
}

impl GameApi for HttpGameApi {
    fn start_registration(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        let api = self.clone();
        Box::pin(async move { api.post_action(START_REGISTRATION).await })
    }

    fn start_game(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        let api = self.clone();
        Box::pin(async move { api.post_action(START_GAME).await })
    }

    fn start_first_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        let api = self.clone();
        Box::pin(async move { api.post_action(START_FIRST_QUESTION).await })
    }

    fn next_question(&self) -> BoxFuture<'static, ApiResult<Option<String>>> {
        let api = self.clone();
        Box::pin(async move { api.post_action(NEXT_QUESTION).await })
    }

    fn list_users(&self) -> BoxFuture<'static, ApiResult<Vec<Participant>>> {
        let api = self.clone();
        Box::pin(async move {
            let response = api.send(api.request(Method::GET, USERS), USERS).await?;
            let users = Self::decode::<Vec<UserResponse>>(response, USERS).await?;
            Ok(users.into_iter().map(Into::into).collect())
        })
    }

    fn register(&self, request: RegisterRequest) -> BoxFuture<'static, ApiResult<Participant>> {
        let api = self.clone();
        Box::pin(async move {
            let builder = api.request(Method::POST, REGISTER).json(&request);
            let response = api.send(builder, REGISTER).await?;
            let user = Self::decode::<UserResponse>(response, REGISTER).await?;
            Ok(user.into())
        })
    }

    fn submit_answer(
        &self,
        request: SubmitAnswerRequest,
    ) -> BoxFuture<'static, ApiResult<AnswerResponse>> {
        let api = self.clone();
        Box::pin(async move {
            let builder = api.request(Method::POST, SUBMIT_ANSWER).json(&request);
            let response = api.send(builder, SUBMIT_ANSWER).await?;
            Self::decode::<AnswerResponse>(response, SUBMIT_ANSWER)
                .await
                .map_err(Into::into)
        })
    }
}

//! Error types for the HTTP backend client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::dao::error::ApiError;

/// Convenient result alias returning [`HttpApiError`] failures.
pub type HttpResult<T> = Result<T, HttpApiError>;

/// Failures that can occur while talking to the backend over HTTP.
#[derive(Debug, Error)]
pub enum HttpApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build HTTP client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or timed out.
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend returned a non-success status.
    #[error("unexpected response status {status} for `{path}`")]
    RequestStatus {
        path: String,
        status: StatusCode,
        detail: Option<String>,
    },
    /// Response payload could not be parsed into the expected model.
    #[error("failed to decode response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
}

impl From<HttpApiError> for ApiError {
    fn from(err: HttpApiError) -> Self {
        match err {
            HttpApiError::ClientBuilder { source } => ApiError::transport("", source),
            HttpApiError::RequestSend { path, source } => ApiError::transport(path, source),
            HttpApiError::RequestStatus {
                path,
                status,
                detail,
            } => ApiError::Status {
                path,
                status: status.as_u16(),
                detail,
            },
            HttpApiError::DecodeResponse { path, source } => ApiError::decode(path, source),
        }
    }
}

use std::error::Error;

use thiserror::Error;

/// Result alias for backend API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error raised by a backend API regardless of the transport behind it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response.
    #[error("request to `{path}` failed: {message}")]
    Transport {
        path: String,
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The backend answered with a non-success status.
    #[error("backend returned status {status} for `{path}`{}", describe_detail(.detail))]
    Status {
        path: String,
        status: u16,
        detail: Option<String>,
    },
    /// The backend answered successfully but refused the action.
    #[error("backend rejected `{path}`: {message}")]
    Rejected { path: String, message: String },
    /// The response body did not match the expected shape.
    #[error("failed to decode response for `{path}`")]
    Decode {
        path: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ApiError {
    /// Construct a transport error from any client failure.
    pub fn transport(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ApiError::Transport {
            path: path.into(),
            message: source.to_string(),
            source: Box::new(source),
        }
    }

    /// Construct a decode error from any deserialization failure.
    pub fn decode(path: impl Into<String>, source: impl Error + Send + Sync + 'static) -> Self {
        ApiError::Decode {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether the same request may succeed later without any change.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport { .. } => true,
            ApiError::Status { status, .. } => *status >= 500 || matches!(*status, 408 | 429),
            ApiError::Rejected { .. } | ApiError::Decode { .. } => false,
        }
    }
}

fn describe_detail(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(": {detail}"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_includes_detail() {
        let err = ApiError::Status {
            path: "/register".into(),
            status: 400,
            detail: Some("Registration is not open".into()),
        };
        assert_eq!(
            err.to_string(),
            "backend returned status 400 for `/register`: Registration is not open"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn status_message_without_detail() {
        let err = ApiError::Status {
            path: "/users".into(),
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "backend returned status 502 for `/users`");
        assert!(err.is_retryable());
    }
}

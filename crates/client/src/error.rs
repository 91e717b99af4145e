use engine::EngineError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single HTTP round-trip.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotAuthenticated,
    #[error("session expired")]
    Unauthorized,
    #[error("forbidden")]
    Forbidden(Option<String>),
    #[error("not found")]
    NotFound(Option<String>),
    #[error("conflict: {}", .0.as_deref().unwrap_or("unknown error"))]
    Conflict(Option<String>),
    #[error("validation error: {}", .0.as_deref().unwrap_or("unknown error"))]
    Validation(Option<String>),
    #[error("server error ({status}): {}", .message.as_deref().unwrap_or("unknown error"))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("invalid base_url: {0}")]
    InvalidUrl(String),
    #[error("server not reachable: {0}")]
    Transport(reqwest::Error),
}

impl ClientError {
    pub(crate) fn from_status(status: StatusCode, message: Option<String>) -> Self {
        match status.as_u16() {
            400 | 422 => Self::Validation(message),
            401 => Self::Unauthorized,
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            status => Self::Server { status, message },
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err)
        }
    }

    /// The server's own error text, when it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Validation(message)
            | Self::Server { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Transport(err) => err.is_connect() || err.is_request(),
            Self::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Failure of a store operation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Client(ClientError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("{0}")]
    Invalid(String),
    #[error("session expired")]
    SessionExpired,
    #[error("operation cancelled")]
    Cancelled,
    #[error("request task failed: {0}")]
    TaskFailed(String),
}

impl From<ClientError> for StoreError {
    fn from(value: ClientError) -> Self {
        match value {
            ClientError::Unauthorized => Self::SessionExpired,
            other => Self::Client(other),
        }
    }
}

impl StoreError {
    /// Text shown to the user: the server's message verbatim when present,
    /// `fallback` otherwise.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Client(err) => err.server_message().unwrap_or(fallback).to_string(),
            Self::Invalid(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Client(err) if err.is_retryable())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, None),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, Some("bad".to_string())),
            ClientError::Validation(Some(_))
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, None),
            ClientError::NotFound(None)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_GATEWAY, None),
            ClientError::Server { status: 502, .. }
        ));
    }

    #[test]
    fn user_message_prefers_server_text() {
        let err = StoreError::from(ClientError::Validation(Some(
            "Amount must be positive".to_string(),
        )));
        assert_eq!(err.user_message("fallback"), "Amount must be positive");

        let err = StoreError::from(ClientError::NotFound(None));
        assert_eq!(err.user_message("fallback"), "fallback");
        assert_eq!(StoreError::Cancelled.user_message("fallback"), "fallback");
    }

    #[test]
    fn unauthorized_becomes_session_expired() {
        assert!(matches!(
            StoreError::from(ClientError::Unauthorized),
            StoreError::SessionExpired
        ));
    }

    #[test]
    fn retryable_errors() {
        assert!(ClientError::Timeout.is_retryable());
        assert!(
            ClientError::Server {
                status: 503,
                message: None
            }
            .is_retryable()
        );
        assert!(!ClientError::Validation(None).is_retryable());
        assert!(StoreError::Client(ClientError::Timeout).is_retryable());
        assert!(!StoreError::SessionExpired.is_retryable());
    }
}

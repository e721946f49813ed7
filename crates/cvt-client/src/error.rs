//! Error types for backend calls.

use cvt_core::{CoreError, ValidationErrors};
use thiserror::Error;

/// Errors raised while talking to the backend.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request could not be sent or the response not read.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path.
        endpoint: String,
        /// Response body, possibly empty.
        body: String,
    },

    /// A response body did not decode.
    #[error("invalid response body: {0}")]
    Json(#[from] serde_json::Error),

    /// A domain rule rejected the request before it was sent.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A URL could not be built.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotAuthenticated,

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The log stream failed.
    #[error("log stream error: {0}")]
    Stream(String),
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Core(CoreError::Validation(errors))
    }
}

impl ClientError {
    /// HTTP status, when the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether a read may be retried. Client errors (4xx) and local rule
    /// failures are final.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status >= 500,
            Self::Request(_) | Self::Io(_) | Self::Stream(_) => true,
            _ => false,
        }
    }

    /// Validation failures, when this error carries them.
    #[must_use]
    pub fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Core(CoreError::Validation(errors)) => Some(errors),
            _ => None,
        }
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use cvt_core::ValidationBuilder;

    #[test]
    fn error_display_messages() {
        let err = ClientError::Status {
            status: 404,
            endpoint: "member/42".into(),
            body: "not found".into(),
        };
        assert_eq!(err.to_string(), "member/42 returned 404: not found");
        assert_eq!(ClientError::NotAuthenticated.to_string(), "not signed in");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }

    #[test]
    fn retry_classification() {
        let server = ClientError::Status {
            status: 503,
            endpoint: "x".into(),
            body: String::new(),
        };
        let client = ClientError::Status {
            status: 401,
            endpoint: "x".into(),
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(!ClientError::Core(CoreError::SelfDeletion).is_retryable());
        assert_eq!(client.status(), Some(401));
    }

    #[test]
    fn validation_errors_convert() {
        let errors = ValidationBuilder::new()
            .validate_not_empty("name", "")
            .finish()
            .unwrap_err();
        let err: ClientError = errors.into();
        assert_eq!(err.validation().map(ValidationErrors::len), Some(1));
    }
}

//! Client error types.

use std::time::Duration;

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error code from server.
        code: String,
        /// Error message from server.
        message: String,
    },

    /// Server rejected the credentials attached to the request (HTTP 401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server answered with `status: false` in its response envelope.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// Response body did not match the expected schema.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Recovering from an expired access token failed.
    #[error(transparent)]
    Refresh(#[from] RefreshError),
}

impl Error {
    /// Check if this is a not-found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_)) || matches!(self, Error::Api { status: 404, .. })
    }

    /// Check if the server rejected the request's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized(_))
    }

    /// Check if this is any authentication failure, including a failed refresh.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            Error::Unauthorized(_) | Error::Refresh(_) | Error::Rejected(_)
        )
    }

    /// Check if this is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }

    /// HTTP status associated with this error, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            Error::Unauthorized(_) => Some(401),
            Error::NotFound(_) => Some(404),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            Error::Refresh(RefreshError::Failed { status, .. }) => *status,
            _ => None,
        }
    }
}

/// Why a token refresh cycle failed.
///
/// Cloned to every request that was waiting on the cycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// The refresh completed without producing an access token.
    #[error("token refresh produced no access token")]
    NoToken,

    /// The refresh call did not settle in time.
    #[error("token refresh timed out after {0:?}")]
    TimedOut(Duration),

    /// The refresh call returned an error.
    #[error("token refresh failed: {message}")]
    Failed {
        /// HTTP status of the failed refresh call, if it got that far.
        status: Option<u16>,
        /// Rendered error.
        message: String,
    },

    /// The task driving the refresh was dropped before it settled.
    #[error("token refresh was abandoned before completing")]
    Abandoned,
}

impl RefreshError {
    pub(crate) fn from_error(error: Error) -> Self {
        match error {
            Error::Refresh(inner) => inner,
            other => RefreshError::Failed {
                status: other.status(),
                message: other.to_string(),
            },
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error response from the server.
#[derive(Debug, Default, serde::Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let unauthorized = Error::Unauthorized("expired".to_string());
        assert!(unauthorized.is_unauthorized());
        assert!(unauthorized.is_auth_error());
        assert_eq!(unauthorized.status(), Some(401));

        let server = Error::Api {
            status: 503,
            code: "unavailable".to_string(),
            message: "down".to_string(),
        };
        assert!(server.is_server_error());
        assert!(!server.is_unauthorized());

        let refresh = Error::Refresh(RefreshError::NoToken);
        assert!(refresh.is_auth_error());
        assert!(!refresh.is_unauthorized());
    }

    #[test]
    fn test_refresh_error_from_error_keeps_status() {
        let err = RefreshError::from_error(Error::Unauthorized("refresh token revoked".into()));
        match err {
            RefreshError::Failed { status, message } => {
                assert_eq!(status, Some(401));
                assert!(message.contains("refresh token revoked"));
            }
            other => panic!("expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_refresh_error_from_error_unwraps_nested() {
        let err = RefreshError::from_error(Error::Refresh(RefreshError::TimedOut(
            Duration::from_secs(3),
        )));
        assert_eq!(err, RefreshError::TimedOut(Duration::from_secs(3)));
    }
}

//! REST API client.
//!
//! Every backend call goes through [`ApiClient`], which attaches the
//! principal's bearer token, enforces the request timeout and turns a
//! 401/403 into a forced sign-out. Endpoint groups live in submodules as
//! `impl ApiClient` blocks.

pub mod admin;
pub mod auth;
pub mod client;
pub mod customers;
pub mod driver;
pub mod sales;

pub use client::ApiClient;
pub use sales::SalesApi;

use thiserror::Error;

/// Backend call failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// No credential is available for an authenticated call
    #[error("No authentication token found")]
    NotAuthenticated,

    /// The backend rejected the credential; the session has been ended
    #[error("Session expired. Please sign in again.")]
    SessionExpired,

    /// The request exceeded the configured timeout
    #[error("The server did not respond in time")]
    Timeout,

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status with a domain message
    #[error("{message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// User-facing message
        message: String,
    },

    /// The response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Refused before reaching the backend
    #[error("{0}")]
    InvalidInput(&'static str),
}

impl ApiError {
    /// Whether the session ended, which callers must treat as a global sign-out.
    #[must_use]
    pub const fn is_session_ended(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NotAuthenticated)
    }

    /// Message safe to show a user. Raw transport and decode details are
    /// replaced by `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::NotAuthenticated | Self::SessionExpired | Self::Timeout | Self::InvalidInput(_) => {
                self.to_string()
            },
            Self::Status { message, .. } => message.clone(),
            Self::Transport(_) | Self::Decode(_) => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_details_never_reach_the_user() {
        let err = ApiError::Transport("tcp connect error: 10.0.0.3:8000".into());
        assert_eq!(err.user_message("Could not load customers"), "Could not load customers");
    }

    #[test]
    fn backend_message_is_kept() {
        let err = ApiError::Status {
            status: 409,
            message: "Seat 4 is already taken".into(),
        };
        assert_eq!(err.user_message("fallback"), "Seat 4 is already taken");
    }

    #[test]
    fn session_expiry_is_distinguishable() {
        assert!(ApiError::SessionExpired.is_session_ended());
        assert!(!ApiError::Timeout.is_session_ended());
        assert_eq!(
            ApiError::SessionExpired.user_message("x"),
            "Session expired. Please sign in again."
        );
    }
}

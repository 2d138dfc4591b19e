//! Mapping of client and store failures onto HTTP errors.

use crate::api::ApiError;
use axum::http::StatusCode;
use busdesk_runtime::StoreError;
use busdesk_web::AppError;

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotAuthenticated => Self::unauthorized("Please sign in"),
            ApiError::SessionExpired => Self::session_expired(),
            ApiError::Timeout => Self::timeout("The ticketing service did not answer in time"),
            ApiError::Transport(detail) => {
                Self::unavailable("The ticketing service is unreachable")
                    .with_source(anyhow::anyhow!(detail))
            },
            ApiError::Status {
                status: 404,
                message,
            } => Self::new(StatusCode::NOT_FOUND, message, "NOT_FOUND"),
            ApiError::Status {
                status: 400 | 422,
                message,
            } => Self::validation(message),
            ApiError::Status { message, .. } => Self::upstream(message),
            ApiError::InvalidInput(message) => Self::validation(message),
            ApiError::Decode(detail) => {
                Self::upstream("Unexpected response from the ticketing service")
                    .with_source(anyhow::anyhow!(detail))
            },
        }
    }
}

/// A dialog store refused work (only happens while shutting down).
pub(crate) fn store_error(err: StoreError) -> AppError {
    AppError::unavailable("The sale dialog is not accepting input").with_source(err.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_rejections_keep_their_message() {
        let err = AppError::from(ApiError::Status {
            status: 422,
            message: "Seat 4 is already taken".into(),
        });
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.message(), "Seat 4 is already taken");

        let err = AppError::from(ApiError::Status {
            status: 500,
            message: "Failed to sell tickets".into(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.message(), "Failed to sell tickets");
    }

    #[test]
    fn session_expiry_is_distinguishable() {
        let err = AppError::from(ApiError::SessionExpired);
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "SESSION_EXPIRED");

        let err = AppError::from(ApiError::NotAuthenticated);
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[test]
    fn transport_details_stay_internal() {
        let err = AppError::from(ApiError::Transport("connection refused (os error 111)".into()));
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(!err.message().contains("os error"));

        let err = AppError::from(ApiError::Timeout);
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}

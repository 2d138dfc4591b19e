//! The error every handler returns.
//!
//! An [`AppError`] renders as `{"code": "...", "message": "..."}` with its
//! HTTP status. The message is what the dashboard shows the user; the
//! attached source, if any, only reaches the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

/// Handler error: status, stable code, user-facing message.
///
/// ```ignore
/// async fn ticket(Path(id): Path<Id>) -> Result<Json<Ticket>, AppError> {
///     let ticket = lookup(id).await.ok_or_else(|| AppError::not_found("Ticket", id))?;
///     Ok(Json(ticket))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Error with an explicit status and code.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>, code: &'static str) -> Self {
        Self {
            status,
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Keep `source` for the logs.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code, stable across releases.
    #[must_use]
    pub const fn code(&self) -> &str {
        self.code
    }

    /// Message for the user.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// 401 telling the client to sign in again.
    #[must_use]
    pub fn session_expired() -> Self {
        Self::unauthorized("Session expired, please sign in again").recode("SESSION_EXPIRED")
    }

    /// 404 for `resource` `id`.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND",
        )
    }

    fn recode(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }
}

macro_rules! by_status {
    ($($(#[$doc:meta])* $name:ident => $status:ident, $code:literal;)*) => {
        impl AppError {
            $(
                $(#[$doc])*
                #[must_use]
                pub fn $name(message: impl Into<String>) -> Self {
                    Self::new(StatusCode::$status, message, $code)
                }
            )*
        }
    };
}

by_status! {
    /// 400: the request could not be understood.
    bad_request => BAD_REQUEST, "BAD_REQUEST";
    /// 401: no usable session.
    unauthorized => UNAUTHORIZED, "UNAUTHORIZED";
    /// 403: signed in, but not allowed.
    forbidden => FORBIDDEN, "FORBIDDEN";
    /// 422: the input was understood and rejected.
    validation => UNPROCESSABLE_ENTITY, "VALIDATION_ERROR";
    /// 500: a fault on this side.
    internal => INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR";
    /// 502: the backend answered with a failure.
    upstream => BAD_GATEWAY, "UPSTREAM_ERROR";
    /// 503: the backend or a local component cannot be reached.
    unavailable => SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE";
    /// 504: the backend did not answer in time.
    timeout => GATEWAY_TIMEOUT, "TIMEOUT";
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[derive(Serialize)]
struct Body<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let source = self.source.as_ref().map(|e| tracing::field::display(format!("{e:#}")));
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = self.code,
                message = %self.message,
                error = source,
                "Request failed"
            );
        } else {
            tracing::debug!(status = %self.status, code = self.code, "Request rejected");
        }

        let body = Json(Body {
            code: self.code,
            message: &self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

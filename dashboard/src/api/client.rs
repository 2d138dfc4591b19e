//! Token-attaching HTTP client shared by all endpoint groups.

use super::ApiError;
use crate::config::ApiConfig;
use crate::session::SessionHandle;
use reqwest::{Method, RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// How a non-success response is turned into a user message.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ErrorMessage {
    /// Always use this message.
    Fixed(&'static str),
    /// Use the body's `message` field when present, else this one.
    FromBody(&'static str),
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the backend REST API.
///
/// Cheap to clone. [`ApiClient::with_session`] derives a per-principal client
/// sharing the same connection pool.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    session: SessionHandle,
}

impl ApiClient {
    /// Build an anonymous client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built
    /// (for example when the TLS backend fails to initialise).
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            session: SessionHandle::anonymous(),
        })
    }

    /// Same client acting for another session.
    #[must_use]
    pub fn with_session(&self, session: SessionHandle) -> Self {
        Self {
            http: self.http.clone(),
            base_url: Arc::clone(&self.base_url),
            session,
        }
    }

    /// The session this client acts for.
    #[must_use]
    pub const fn session(&self) -> &SessionHandle {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Unauthenticated request (login).
    pub(crate) fn public_request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(header::CONTENT_TYPE, "application/json")
    }

    /// Authenticated request with bearer token and JSON content type.
    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let Some(token) = self.session.token() else {
            tracing::debug!(%method, path, "No token for authenticated request");
            return Err(ApiError::NotAuthenticated);
        };

        Ok(self.public_request(method, path).bearer_auth(token))
    }

    /// Send a request, converting 401/403 into a forced sign-out.
    pub(crate) async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = send(builder).await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let status = response.status();
            if self.session.force_sign_out() {
                tracing::warn!(%status, url = %response.url().path(), "Credential rejected, signing out");
            }
            return Err(ApiError::SessionExpired);
        }

        Ok(response)
    }

    /// Authenticated GET decoding a JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        on_error: ErrorMessage,
    ) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        decode(ensure_success(response, on_error).await?).await
    }

    /// Authenticated call with a JSON body, decoding a JSON response.
    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        on_error: ErrorMessage,
    ) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(method, path)?.json(body);
        let response = self.execute(builder).await?;
        decode(ensure_success(response, on_error).await?).await
    }

    /// Authenticated call whose response body is ignored.
    pub(crate) async fn send_empty(
        &self,
        builder: RequestBuilder,
        on_error: ErrorMessage,
    ) -> Result<(), ApiError> {
        let response = self.execute(builder).await?;
        ensure_success(response, on_error).await.map(drop)
    }

    /// Authenticated GET returning the raw body bytes.
    pub(crate) async fn get_bytes(
        &self,
        path: &str,
        on_error: ErrorMessage,
    ) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::GET, path)?).await?;
        let bytes = ensure_success(response, on_error).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}

/// Accept `value` as one URL path segment: ASCII letters, digits, `-` and
/// `_` only, so it can never leave the path it is placed in.
pub(crate) fn path_segment<'a>(value: &'a str, what: &'static str) -> Result<&'a str, ApiError> {
    let valid = !value.is_empty()
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
    if valid { Ok(value) } else { Err(ApiError::InvalidInput(what)) }
}

/// Send without the sign-out check. Used by the login flow, where a 401
/// means bad credentials.
pub(crate) async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    let response = builder.send().await.map_err(|e| {
        let err = ApiError::from(e);
        tracing::warn!(error = %err, "Backend request failed");
        err
    })?;

    tracing::debug!(
        status = %response.status(),
        path = %response.url().path(),
        "Backend responded"
    );
    metrics::counter!("api.requests", "status" => response.status().as_u16().to_string())
        .increment(1);

    Ok(response)
}

/// Pass through 2xx responses; turn anything else into [`ApiError::Status`].
pub(crate) async fn ensure_success(
    response: Response,
    on_error: ErrorMessage,
) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match on_error {
        ErrorMessage::Fixed(message) => message.to_string(),
        ErrorMessage::FromBody(fallback) => response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| fallback.to_string()),
    };

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(e.to_string()))
}

//! Backend login: exchange credentials for a token, then load the user.

use super::ApiError;
use super::client::{self, ApiClient, ErrorMessage};
use crate::types::{Id, Principal, Role};
use reqwest::Method;
use serde::{Deserialize, Serialize};

/// Credentials posted to the sign-in form.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Credentials {
    /// Email
    pub email: String,
    /// Password
    pub password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    token: Option<String>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: Option<BackendUser>,
}

#[derive(Deserialize)]
struct BackendUser {
    id: Id,
    email: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl ApiClient {
    /// Log in and build the principal.
    ///
    /// Returns `Ok(None)` when the backend rejects the credentials or answers
    /// without a token or user.
    ///
    /// # Errors
    ///
    /// Transport, timeout and decode failures.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Option<Principal>, ApiError> {
        let login = self.public_request(Method::POST, "/login").json(credentials);
        let response = client::send(login).await?;
        if !response.status().is_success() {
            tracing::info!(status = %response.status(), "Login rejected");
            return Ok(None);
        }
        let Some(token) = client::decode::<LoginBody>(response)
            .await?
            .token
            .filter(|t| !t.is_empty())
        else {
            return Ok(None);
        };

        let lookup = self.public_request(Method::GET, "/user").bearer_auth(&token);
        let response = client::send(lookup).await?;
        let response = match client::ensure_success(response, ErrorMessage::Fixed("No user")).await {
            Ok(response) => response,
            Err(ApiError::Status { status, .. }) => {
                tracing::info!(status, "User lookup rejected");
                return Ok(None);
            },
            Err(e) => return Err(e),
        };
        let Some(user) = client::decode::<UserEnvelope>(response).await?.user else {
            return Ok(None);
        };

        let role = user.role.as_deref().and_then(Role::parse);
        if role.is_none() {
            tracing::warn!(user_id = user.id, role = ?user.role, "User has no recognised role");
        }

        Ok(Some(Principal {
            id: user.id,
            email: user.email,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
            role,
            token,
        }))
    }
}

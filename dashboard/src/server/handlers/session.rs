//! Sign-in page, sign-in and sign-out.

use crate::access::gate::SIGN_IN_PATH;
use crate::access::landing_page;
use crate::api::auth::Credentials;
use crate::server::state::AppState;
use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use busdesk_web::AppError;
use serde::Serialize;

/// What the sign-in page needs.
#[derive(Debug, Serialize)]
pub struct SignInPage {
    /// Where credentials are posted
    pub action: &'static str,
    /// Form fields
    pub fields: [&'static str; 2],
}

/// `GET /`
///
/// Signed-in users with a dashboard are sent to their landing page.
pub async fn sign_in_page(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let landing = state
        .gatekeeper
        .principal(&headers)
        .and_then(|principal| principal.role)
        .map(landing_page);

    match landing {
        Some(landing) if landing != SIGN_IN_PATH => Redirect::to(landing).into_response(),
        _ => Json(SignInPage {
            action: "/sign-in",
            fields: ["email", "password"],
        })
        .into_response(),
    }
}

/// `POST /sign-in`
///
/// # Errors
///
/// - 401 for wrong credentials
/// - 403 for accounts without a dashboard
/// - backend failures as mapped from [`crate::api::ApiError`]
pub async fn sign_in(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(credentials): Json<Credentials>,
) -> Result<(CookieJar, Redirect), AppError> {
    let Some(principal) = state.api.login(&credentials).await? else {
        tracing::info!(email = %credentials.email, "Sign-in rejected");
        metrics::counter!("session.sign_in", "outcome" => "rejected").increment(1);
        return Err(AppError::unauthorized("Invalid email or password"));
    };

    let landing = principal.role.map_or(SIGN_IN_PATH, landing_page);
    if landing == SIGN_IN_PATH {
        tracing::info!(user_id = principal.id, role = ?principal.role, "No dashboard for this account");
        metrics::counter!("session.sign_in", "outcome" => "forbidden").increment(1);
        return Err(AppError::forbidden("This account has no access to the dashboard"));
    }

    let token = state
        .gatekeeper
        .keys()
        .issue(&principal, state.clock.now())
        .map_err(|e| AppError::internal("Could not start a session").with_source(e.into()))?;

    let cookie = Cookie::build((state.gatekeeper.cookie_name().to_owned(), token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.session.secure_cookies);

    tracing::info!(user_id = principal.id, landing, "Signed in");
    metrics::counter!("session.sign_in", "outcome" => "accepted").increment(1);
    Ok((jar.add(cookie), Redirect::to(landing)))
}

/// `POST /sign-out`
///
/// Always succeeds; an unknown or expired session just loses its cookie.
pub async fn sign_out(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> (CookieJar, Redirect) {
    if let Some(principal) = state.gatekeeper.principal(&headers) {
        state.gatekeeper.revoked().revoke(&principal.token);
        state.dialogs.remove(&principal.token).await;
        tracing::info!(user_id = principal.id, "Signed out");
    }

    let cookie = Cookie::build((state.gatekeeper.cookie_name().to_owned(), "")).path("/");
    (jar.remove(cookie), Redirect::to(SIGN_IN_PATH))
}

//! Axum middleware applying the gate to every dashboard request.

use super::gate::{AccessDecision, decide};
use crate::session::{RevokedSessions, SessionKeys};
use crate::types::Principal;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use busdesk_web::BearerToken;

/// What the gate needs to turn a request into a principal.
#[derive(Clone, Debug)]
pub struct Gatekeeper {
    keys: SessionKeys,
    revoked: RevokedSessions,
    cookie_name: String,
}

impl Gatekeeper {
    /// Gatekeeper reading the `cookie_name` cookie.
    #[must_use]
    pub fn new(keys: SessionKeys, revoked: RevokedSessions, cookie_name: impl Into<String>) -> Self {
        Self {
            keys,
            revoked,
            cookie_name: cookie_name.into(),
        }
    }

    /// Session keys used to verify tokens.
    #[must_use]
    pub const fn keys(&self) -> &SessionKeys {
        &self.keys
    }

    /// Revocation list consulted on every request.
    #[must_use]
    pub const fn revoked(&self) -> &RevokedSessions {
        &self.revoked
    }

    /// Name of the session cookie.
    #[must_use]
    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// The session token from the cookie, else from a bearer header.
    #[must_use]
    pub fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        CookieJar::from_headers(headers)
            .get(&self.cookie_name)
            .map(|cookie| cookie.value().to_string())
            .or_else(|| {
                headers
                    .get(header::AUTHORIZATION)
                    .and_then(|v| v.to_str().ok())
                    .and_then(BearerToken::parse)
                    .map(|BearerToken(token)| token)
            })
    }

    /// Resolve the signed-in principal. Invalid, expired and revoked sessions
    /// resolve to `None`.
    #[must_use]
    pub fn principal(&self, headers: &HeaderMap) -> Option<Principal> {
        let token = self.session_token(headers)?;
        let principal = match self.keys.verify(&token) {
            Ok(claims) => claims.into_principal(),
            Err(e) => {
                tracing::debug!(error = %e, "Session rejected");
                return None;
            },
        };

        if self.revoked.is_revoked(&principal.token) {
            tracing::debug!(user_id = principal.id, "Session was signed out");
            return None;
        }
        Some(principal)
    }
}

/// Gate middleware. Install with `axum::middleware::from_fn_with_state`.
///
/// Allowed requests get the [`Principal`] in their extensions; denied ones
/// are answered with `303 See Other`.
pub async fn access_gate(
    State(gatekeeper): State<Gatekeeper>,
    mut request: Request,
    next: Next,
) -> Response {
    let principal = gatekeeper.principal(request.headers());
    let role = principal.as_ref().and_then(|p| p.role);
    let path = request.uri().path().to_owned();

    match decide(&path, role) {
        AccessDecision::Allow => {
            tracing::debug!(%path, ?role, "Access allowed");
            if let Some(principal) = principal {
                request.extensions_mut().insert(principal);
            }
            next.run(request).await
        },
        AccessDecision::Redirect(location) => {
            tracing::debug!(%path, ?role, location, "Access redirected");
            metrics::counter!("gate.redirects").increment(1);
            Redirect::to(location).into_response()
        },
    }
}

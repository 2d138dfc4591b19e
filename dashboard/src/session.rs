//! Session layer: signed session tokens, revocation and the forced sign-out latch.
//!
//! The dashboard keeps no server-side session table. After a successful
//! backend login it issues an HS256 token carrying the [`Principal`] claims and
//! stores it in an HTTP-only cookie. Tokens revoked by sign-out (voluntary or
//! forced by a backend 401/403) are remembered in [`RevokedSessions`] for one
//! session lifetime.

use crate::types::{Id, Principal, Role};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Session token failures.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Token could not be signed
    #[error("failed to sign session token: {0}")]
    Signing(String),

    /// Token expired
    #[error("session token expired")]
    Expired,

    /// Token malformed or signature mismatch
    #[error("invalid session token: {0}")]
    Invalid(String),
}

/// Invoked when a backend call reports the credential is no longer valid.
pub trait SignOutHook: Send + Sync {
    /// End the session owning `token`.
    fn sign_out(&self, token: &str);
}

/// Hook that does nothing; used for anonymous handles.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSignOut;

impl SignOutHook for NoopSignOut {
    fn sign_out(&self, _token: &str) {}
}

/// Backend tokens whose sessions have ended.
///
/// A token is remembered for `retention` after its revocation. Sessions live
/// at most that long, so every session carrying the token has expired on its
/// own by the time the entry is dropped.
#[derive(Debug, Clone)]
pub struct RevokedSessions {
    tokens: Arc<RwLock<HashMap<String, Instant>>>,
    retention: Duration,
}

impl RevokedSessions {
    /// Empty revocation list keeping entries for `retention`.
    #[must_use]
    pub fn new(retention: Duration) -> Self {
        Self {
            tokens: Arc::default(),
            retention,
        }
    }

    /// Mark `token` as signed out. Returns `false` if it already was.
    ///
    /// Entries older than the retention are pruned on the way.
    pub fn revoke(&self, token: &str) -> bool {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);
        tokens.retain(|_, revoked_at| revoked_at.elapsed() < self.retention);
        if tokens.contains_key(token) {
            return false;
        }
        tokens.insert(token.to_string(), Instant::now());
        true
    }

    /// Whether `token` was signed out.
    #[must_use]
    pub fn is_revoked(&self, token: &str) -> bool {
        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .is_some_and(|revoked_at| revoked_at.elapsed() < self.retention)
    }

    /// Entries currently remembered.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.tokens.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl SignOutHook for RevokedSessions {
    fn sign_out(&self, token: &str) {
        if self.revoke(token) {
            tracing::info!("Session revoked after backend rejected its credential");
        }
    }
}

struct HandleInner {
    token: Option<String>,
    signed_out: AtomicBool,
    hook: Arc<dyn SignOutHook>,
}

/// Shared, read-only view of one principal's backend credential.
///
/// Cloning is cheap; every clone shares the same sign-out latch, so the hook
/// fires once no matter how many concurrent requests see a 401/403.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<HandleInner>,
}

impl SessionHandle {
    /// Handle for `token`, signing out through `hook`.
    #[must_use]
    pub fn new(token: impl Into<String>, hook: Arc<dyn SignOutHook>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                token: Some(token.into()),
                signed_out: AtomicBool::new(false),
                hook,
            }),
        }
    }

    /// Handle without a credential. Every authenticated call fails fast.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            inner: Arc::new(HandleInner {
                token: None,
                signed_out: AtomicBool::new(false),
                hook: Arc::new(NoopSignOut),
            }),
        }
    }

    /// The bearer token, or `None` once signed out.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        if self.is_signed_out() {
            return None;
        }
        self.inner.token.as_deref()
    }

    /// Whether the forced sign-out already happened.
    #[must_use]
    pub fn is_signed_out(&self) -> bool {
        self.inner.signed_out.load(Ordering::Acquire)
    }

    /// Trip the latch. Returns `true` only for the call that fired the hook.
    pub fn force_sign_out(&self) -> bool {
        if self.inner.signed_out.swap(true, Ordering::AcqRel) {
            return false;
        }
        if let Some(token) = &self.inner.token {
            self.inner.hook.sign_out(token);
        }
        true
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("has_token", &self.inner.token.is_some())
            .field("signed_out", &self.is_signed_out())
            .finish_non_exhaustive()
    }
}

/// Claims carried by the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Backend user id
    pub sub: Id,
    /// Email
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Role as sent by the backend; decoded leniently
    #[serde(default)]
    pub role: Option<String>,
    /// Backend bearer token
    pub token: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

impl SessionClaims {
    /// Rebuild the principal. Unknown role names become `None`.
    #[must_use]
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role.as_deref().and_then(Role::parse),
            token: self.token,
        }
    }
}

/// Signs and verifies session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionKeys {
    /// Keys derived from a shared secret.
    #[must_use]
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    /// Session lifetime.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `principal`, valid from `now` for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Signing`] if encoding fails.
    pub fn issue(&self, principal: &Principal, now: DateTime<Utc>) -> Result<String, SessionError> {
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = SessionClaims {
            sub: principal.id,
            email: principal.email.clone(),
            first_name: principal.first_name.clone(),
            last_name: principal.last_name.clone(),
            role: principal.role.map(|role| role.as_str().to_string()),
            token: principal.token.clone(),
            iat: now.timestamp(),
            exp: now.timestamp().saturating_add(ttl),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| SessionError::Signing(e.to_string()))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Expired`] for expired tokens and
    /// [`SessionError::Invalid`] for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            })
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingHook(AtomicUsize);

    impl SignOutHook for CountingHook {
        fn sign_out(&self, _token: &str) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn principal(role: Option<Role>) -> Principal {
        Principal {
            id: 12,
            email: "agent@example.com".into(),
            first_name: "Nino".into(),
            last_name: "Beridze".into(),
            role,
            token: "backend-token".into(),
        }
    }

    #[test]
    fn force_sign_out_fires_hook_once() {
        let hook = Arc::new(CountingHook::default());
        let handle = SessionHandle::new("t", hook.clone());
        let clone = handle.clone();

        assert!(handle.force_sign_out());
        assert!(!clone.force_sign_out());
        assert!(!handle.force_sign_out());
        assert_eq!(hook.0.load(Ordering::SeqCst), 1);
        assert_eq!(clone.token(), None);
    }

    #[test]
    fn anonymous_handle_has_no_token() {
        let handle = SessionHandle::anonymous();
        assert_eq!(handle.token(), None);
        assert!(handle.force_sign_out());
    }

    #[test]
    fn revoked_sessions_hook_records_token() {
        let revoked = RevokedSessions::new(Duration::from_secs(7200));
        let handle = SessionHandle::new("abc", Arc::new(revoked.clone()));
        assert!(!revoked.is_revoked("abc"));
        handle.force_sign_out();
        assert!(revoked.is_revoked("abc"));
        assert!(!revoked.revoke("abc"));
    }

    #[test]
    fn revocations_are_forgotten_after_a_session_lifetime() {
        let revoked = RevokedSessions::new(Duration::ZERO);
        assert!(revoked.revoke("first"));
        assert!(!revoked.is_revoked("first"));

        assert!(revoked.revoke("second"));
        assert_eq!(revoked.tracked(), 1);
    }

    #[test]
    fn issued_token_verifies_back_to_principal() {
        let keys = SessionKeys::new(b"secret", Duration::from_secs(7200));
        let token = keys.issue(&principal(Some(Role::SalesAgent)), Utc::now()).unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.exp - claims.iat, 7200);
        assert_eq!(claims.into_principal(), principal(Some(Role::SalesAgent)));
    }

    #[test]
    fn expired_token_rejected() {
        let keys = SessionKeys::new(b"secret", Duration::from_secs(60));
        let issued = Utc::now() - chrono::Duration::hours(3);
        let token = keys.issue(&principal(Some(Role::Admin)), issued).unwrap();
        assert!(matches!(keys.verify(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn token_signed_with_other_secret_rejected() {
        let issuer = SessionKeys::new(b"one", Duration::from_secs(60));
        let verifier = SessionKeys::new(b"two", Duration::from_secs(60));
        let token = issuer.issue(&principal(None), Utc::now()).unwrap();
        assert!(matches!(verifier.verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn unknown_role_claim_decodes_to_none() {
        let claims = SessionClaims {
            sub: 1,
            email: "x@example.com".into(),
            first_name: String::new(),
            last_name: String::new(),
            role: Some("superuser".into()),
            token: "t".into(),
            iat: 0,
            exp: 1,
        };
        assert_eq!(claims.into_principal().role, None);
    }
}

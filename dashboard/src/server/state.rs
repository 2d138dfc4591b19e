//! Application state for the dashboard HTTP server.

use super::dialog::{DialogParts, DialogRegistry, SaleDialog};
use crate::access::Gatekeeper;
use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::session::{RevokedSessions, SessionHandle, SessionKeys, SignOutHook};
use crate::types::Principal;
use busdesk_core::environment::Clock;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

/// Application state shared across all HTTP handlers.
///
/// Cloned per request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Loaded configuration
    pub config: Arc<Config>,

    /// Client without a credential; per-request clients derive from it
    pub api: ApiClient,

    /// Session verification and revocation
    pub gatekeeper: Gatekeeper,

    /// Source of "now" for sessions and dialogs
    pub clock: Arc<dyn Clock>,

    /// Open sale dialogs
    pub dialogs: DialogRegistry,
}

impl AppState {
    /// Build the state from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: Config, clock: Arc<dyn Clock>) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api)?;
        let ttl = Duration::from_secs(config.session.ttl_secs);
        let keys = SessionKeys::new(config.session.secret.as_bytes(), ttl);
        let gatekeeper = Gatekeeper::new(
            keys,
            RevokedSessions::new(ttl),
            config.session.cookie_name.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            api,
            gatekeeper,
            clock,
            dialogs: DialogRegistry::new(ttl),
        })
    }

    /// Today according to the state's clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }

    /// A backend client acting as `principal`. A 401/403 on any of its calls
    /// revokes the principal's session and drops its sale dialog.
    #[must_use]
    pub fn client_for(&self, principal: &Principal) -> ApiClient {
        let hook = Arc::new(EndSession {
            revoked: self.gatekeeper.revoked().clone(),
            dialogs: self.dialogs.clone(),
        });
        self.api
            .with_session(SessionHandle::new(principal.token.clone(), hook))
    }

    /// The principal's sale dialog, started on first use.
    #[must_use]
    pub fn dialog_for(&self, principal: &Principal) -> SaleDialog {
        self.dialogs.get_or_start(&principal.token, || DialogParts {
            user_id: principal.id,
            client: self.client_for(principal),
            clock: Arc::clone(&self.clock),
            reset_delay: self.config.dialog.reset_delay(),
        })
    }

    /// How long a dialog request waits for its effects to settle.
    #[must_use]
    pub fn dialog_settle_timeout(&self) -> Duration {
        self.config.api.timeout() + self.config.dialog.reset_delay() + Duration::from_secs(1)
    }
}

/// Forced sign-out: the backend rejected a principal's credential.
struct EndSession {
    revoked: RevokedSessions,
    dialogs: DialogRegistry,
}

impl SignOutHook for EndSession {
    fn sign_out(&self, token: &str) {
        self.revoked.sign_out(token);
        self.dialogs.discard(token);
    }
}

//! Per-principal sale dialogs and their wire format.

use crate::api::ApiClient;
use crate::sale::{
    PassengerField, SaleAction, SaleEnvironment, SaleEvent, SaleListener, SalePhase, SaleReducer,
    SaleState, SaleStore,
};
use crate::session::SessionHandle;
use crate::types::{Id, Language, SeatNumber};
use busdesk_core::environment::Clock;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

// ============================================================================
// Wire format
// ============================================================================

/// A dialog input posted by the page.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogCommand {
    /// Choose or clear the schedule
    SelectSchedule {
        /// Schedule id; `null` clears it
        schedule_id: Option<Id>,
    },
    /// Choose or clear the travel date
    SelectDate {
        /// `YYYY-MM-DD`; `null` clears it
        schedule_date: Option<NaiveDate>,
    },
    /// Select or deselect one seat
    ToggleSeat {
        /// Seat number
        seat: SeatNumber,
    },
    /// Replace the selection
    ReplaceSeats {
        /// Seats in selection order
        seats: Vec<SeatNumber>,
    },
    /// Edit one passenger field
    UpdatePassenger {
        /// Passenger index
        index: usize,
        /// Field name (`passenger_name`, ...)
        field: PassengerField,
        /// New value
        value: String,
    },
    /// Copy the first passenger's details
    CopyFirstPassenger {
        /// Target passenger index
        index: usize,
    },
    /// Choose the payment method
    SetPaymentMethod {
        /// Method name
        payment_method: String,
    },
    /// Choose the ticket language
    SetLanguage {
        /// `ka` or `en`
        language: Language,
    },
    /// Submit the sale
    Submit,
    /// Clear the form
    Reset,
}

impl From<DialogCommand> for SaleAction {
    fn from(command: DialogCommand) -> Self {
        match command {
            DialogCommand::SelectSchedule { schedule_id } => Self::SelectSchedule(schedule_id),
            DialogCommand::SelectDate { schedule_date } => Self::SelectDate(schedule_date),
            DialogCommand::ToggleSeat { seat } => Self::ToggleSeat(seat),
            DialogCommand::ReplaceSeats { seats } => Self::ReplaceSeats(seats),
            DialogCommand::UpdatePassenger {
                index,
                field,
                value,
            } => Self::UpdatePassenger {
                index,
                field,
                value,
            },
            DialogCommand::CopyFirstPassenger { index } => Self::CopyFirstPassenger { index },
            DialogCommand::SetPaymentMethod { payment_method } => {
                Self::SetPaymentMethod(payment_method)
            },
            DialogCommand::SetLanguage { language } => Self::SetLanguage(language),
            DialogCommand::Submit => Self::Submit,
            DialogCommand::Reset => Self::ResetForm,
        }
    }
}

/// What the page renders after every dialog request.
#[derive(Debug, Clone, Serialize)]
pub struct DialogSnapshot {
    /// Coarse phase
    pub phase: SalePhase,
    /// Whether the seat picker accepts input
    pub seat_picker_enabled: bool,
    /// Full dialog state
    #[serde(flatten)]
    pub state: SaleState,
}

impl DialogSnapshot {
    /// Snapshot of `state`.
    #[must_use]
    pub fn of(state: &SaleState) -> Self {
        Self {
            phase: state.phase(),
            seat_picker_enabled: state.seat_picker_enabled(),
            state: state.clone(),
        }
    }
}

// ============================================================================
// Listener
// ============================================================================

/// Logs dialog events for one agent.
#[derive(Debug, Clone, Copy)]
pub struct TracingListener {
    user_id: Id,
}

impl TracingListener {
    /// Listener for the agent `user_id`.
    #[must_use]
    pub const fn new(user_id: Id) -> Self {
        Self { user_id }
    }
}

impl SaleListener for TracingListener {
    fn on_event(&self, event: SaleEvent) {
        match event {
            SaleEvent::Notice(notice) => {
                tracing::debug!(
                    user_id = self.user_id,
                    severity = ?notice.level,
                    text = %notice.message,
                    "Sale notice"
                );
            },
            SaleEvent::TicketsSold { count } => {
                tracing::info!(user_id = self.user_id, count, "Tickets sold");
            },
            SaleEvent::SessionEnded => {
                tracing::warn!(user_id = self.user_id, "Session ended while selling");
            },
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// One agent's running dialog.
#[derive(Clone)]
pub struct SaleDialog {
    /// The dialog store
    pub store: SaleStore,
    /// Credential the store's API calls use
    pub session: SessionHandle,
}

/// Everything needed to start a dialog.
pub(crate) struct DialogParts {
    pub(crate) user_id: Id,
    pub(crate) client: ApiClient,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) reset_delay: Duration,
}

impl SaleDialog {
    fn start(parts: DialogParts) -> Self {
        let session = parts.client.session().clone();
        let today = parts.clock.now().date_naive();
        let environment = SaleEnvironment::new(
            Arc::new(parts.client),
            parts.clock,
            Arc::new(TracingListener::new(parts.user_id)),
            parts.reset_delay,
        );
        Self {
            store: SaleStore::new(SaleState::idle(today), SaleReducer::new(), environment),
            session,
        }
    }
}

/// How long a stopping dialog may take to finish its running effects.
const STOP_TIMEOUT: Duration = Duration::from_secs(1);

struct Entry {
    dialog: SaleDialog,
    started: Instant,
}

/// Dialogs keyed by backend token.
///
/// An entry lives at most one session lifetime: the session that started it
/// has expired by then.
#[derive(Clone)]
pub struct DialogRegistry {
    dialogs: Arc<Mutex<HashMap<String, Entry>>>,
    lifetime: Duration,
}

impl DialogRegistry {
    /// Empty registry whose entries expire after `lifetime`.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            dialogs: Arc::default(),
            lifetime,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.dialogs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The dialog for `token`, if one was started and has not expired.
    #[must_use]
    pub fn get(&self, token: &str) -> Option<SaleDialog> {
        let mut dialogs = self.lock();
        let entry = dialogs.get(token)?;
        if entry.started.elapsed() < self.lifetime {
            return Some(entry.dialog.clone());
        }
        let expired = dialogs.remove(token)?;
        drop(dialogs);
        tracing::debug!("Sale dialog expired");
        stop(expired.dialog);
        None
    }

    /// The dialog for `token`, starting one from `parts` if needed. Expired
    /// dialogs of other sessions are stopped on the way.
    pub(crate) fn get_or_start(
        &self,
        token: &str,
        parts: impl FnOnce() -> DialogParts,
    ) -> SaleDialog {
        let mut dialogs = self.lock();
        let lifetime = self.lifetime;
        let expired: Vec<String> = dialogs
            .iter()
            .filter(|(_, entry)| entry.started.elapsed() >= lifetime)
            .map(|(key, _)| key.clone())
            .collect();
        let expired: Vec<Entry> = expired.iter().filter_map(|key| dialogs.remove(key)).collect();

        let dialog = if let Some(entry) = dialogs.get(token) {
            entry.dialog.clone()
        } else {
            let dialog = SaleDialog::start(parts());
            dialogs.insert(
                token.to_string(),
                Entry {
                    dialog: dialog.clone(),
                    started: Instant::now(),
                },
            );
            tracing::debug!(open_dialogs = dialogs.len(), "Sale dialog started");
            dialog
        };
        drop(dialogs);

        if !expired.is_empty() {
            tracing::debug!(count = expired.len(), "Stopping expired sale dialogs");
        }
        for entry in expired {
            stop(entry.dialog);
        }
        dialog
    }

    /// Forget the dialog for `token` and stop its store in the background.
    /// Safe to call from synchronous code such as a sign-out hook.
    pub fn discard(&self, token: &str) {
        let removed = self.lock().remove(token);
        if let Some(entry) = removed {
            stop(entry.dialog);
        }
    }

    /// Forget the dialog for `token` and wait for its store to stop.
    pub async fn remove(&self, token: &str) {
        let removed = self.lock().remove(token);
        let Some(entry) = removed else {
            return;
        };
        if let Err(e) = entry.dialog.store.shutdown(STOP_TIMEOUT).await {
            tracing::warn!(error = %e, "Sale dialog did not stop cleanly");
        }
    }

    /// Number of dialogs held.
    #[must_use]
    pub fn count(&self) -> usize {
        self.lock().len()
    }
}

/// Shut a dialog's store down on the current runtime; without one there is
/// nothing running and dropping it is enough.
fn stop(dialog: SaleDialog) {
    let Ok(runtime) = tokio::runtime::Handle::try_current() else {
        return;
    };
    runtime.spawn(async move {
        if let Err(e) = dialog.store.shutdown(STOP_TIMEOUT).await {
            tracing::warn!(error = %e, "Sale dialog did not stop cleanly");
        }
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)] // Test code can use unwrap
mod tests {
    use super::*;
    use crate::config::Config;
    use busdesk_core::environment::SystemClock;

    fn parts() -> DialogParts {
        DialogParts {
            user_id: 3,
            client: ApiClient::new(&Config::default().api).unwrap(),
            clock: Arc::new(SystemClock),
            reset_delay: Duration::ZERO,
        }
    }

    #[test]
    fn commands_use_tagged_json() {
        let command: DialogCommand = serde_json::from_value(serde_json::json!({
            "type": "update_passenger",
            "index": 1,
            "field": "passenger_email",
            "value": "ana@example.com",
        }))
        .unwrap();
        assert_eq!(
            SaleAction::from(command),
            SaleAction::UpdatePassenger {
                index: 1,
                field: PassengerField::Email,
                value: "ana@example.com".into(),
            }
        );

        let command: DialogCommand =
            serde_json::from_value(serde_json::json!({"type": "select_schedule"})).unwrap();
        assert_eq!(SaleAction::from(command), SaleAction::SelectSchedule(None));

        let command: DialogCommand =
            serde_json::from_value(serde_json::json!({"type": "reset"})).unwrap();
        assert_eq!(SaleAction::from(command), SaleAction::ResetForm);
    }

    #[test]
    fn snapshot_flattens_state() {
        let state = SaleState::idle(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
        let json = serde_json::to_value(DialogSnapshot::of(&state)).unwrap();
        assert_eq!(json["phase"], "closed");
        assert_eq!(json["seat_picker_enabled"], false);
        assert_eq!(json["form"]["schedule_date"], "2024-06-01");
        assert!(json.get("pending_seat_request").is_none());
    }

    #[tokio::test]
    async fn a_token_keeps_its_dialog_until_discarded() {
        let registry = DialogRegistry::new(Duration::from_secs(60));
        let _dialog = registry.get_or_start("t-1", parts);
        let _again = registry.get_or_start("t-1", || unreachable!("dialog already running"));
        assert_eq!(registry.count(), 1);
        assert!(registry.get("t-1").is_some());

        registry.discard("t-1");
        assert_eq!(registry.count(), 0);
        assert!(registry.get("t-1").is_none());
    }

    #[tokio::test]
    async fn dialogs_expire_with_the_session_lifetime() {
        let registry = DialogRegistry::new(Duration::ZERO);
        let _old = registry.get_or_start("old", parts);
        assert!(registry.get("old").is_none());
        assert_eq!(registry.count(), 0);

        let _a = registry.get_or_start("a", parts);
        let _b = registry.get_or_start("b", parts);
        assert_eq!(registry.count(), 1);
    }
}

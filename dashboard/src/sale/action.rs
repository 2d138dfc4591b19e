//! Inputs of the sale reducer: agent intents and I/O results.

use super::validation::PassengerField;
use crate::api::ApiError;
use crate::types::{Id, Language, SaleConfirmation, SeatNumber};
use chrono::NaiveDate;
use serde::Serialize;

/// A failed backend call, reduced to what the dialog needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleFailure {
    /// Message for the agent
    pub message: String,
    /// The session ended; the dialog must close without a local error
    pub session_expired: bool,
}

impl SaleFailure {
    /// Translate an API error, using `fallback` for details the agent should not see.
    #[must_use]
    pub fn from_api(err: &ApiError, fallback: &str) -> Self {
        Self {
            message: err.user_message(fallback),
            session_expired: err.is_session_ended(),
        }
    }
}

/// Everything the sale reducer reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum SaleAction {
    /// Show the dialog with a fresh form and load payment methods
    Open,
    /// Hide the dialog; the form is cleared after the reset delay
    Close,
    /// Delayed part of [`SaleAction::Close`]
    FinishClose,
    /// Clear the form immediately
    ResetForm,
    /// Choose (or clear) the schedule
    SelectSchedule(Option<Id>),
    /// Choose (or clear) the travel date
    SelectDate(Option<NaiveDate>),
    /// Result of an availability fetch
    SeatsLoaded {
        /// Id issued when the fetch started
        request_id: u64,
        /// Seats, or why they could not be loaded
        result: Result<Vec<SeatNumber>, SaleFailure>,
    },
    /// Select a seat, or deselect it if already selected
    ToggleSeat(SeatNumber),
    /// Replace the whole selection (multi-select widget)
    ReplaceSeats(Vec<SeatNumber>),
    /// Edit one passenger field
    UpdatePassenger {
        /// Passenger index
        index: usize,
        /// Field to change
        field: PassengerField,
        /// New value
        value: String,
    },
    /// Copy passenger 0 into passenger `index`
    CopyFirstPassenger {
        /// Target passenger index (> 0)
        index: usize,
    },
    /// Choose the payment method
    SetPaymentMethod(String),
    /// Choose the ticket language
    SetLanguage(Language),
    /// Result of loading payment methods
    PaymentMethodsLoaded(Result<Vec<String>, SaleFailure>),
    /// Validate and submit the sale
    Submit,
    /// Result of the sale request
    SaleCompleted(Result<SaleConfirmation, SaleFailure>),
}

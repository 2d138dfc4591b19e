//! Sale dialog state.

use super::validation::PassengerErrors;
use crate::types::{DEFAULT_PAYMENT_METHOD, Id, Language, Passenger, SeatNumber, default_payment_methods};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// Seats one sale may contain.
pub const MAX_SEATS_PER_SALE: usize = 5;

/// The fields the agent fills in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleForm {
    /// Chosen schedule
    pub schedule_id: Option<Id>,
    /// Travel date; defaults to today
    pub schedule_date: Option<NaiveDate>,
    /// Seats in selection order
    pub selected_seats: Vec<SeatNumber>,
    /// One form per selected seat, index-aligned; a single placeholder when
    /// no seat is selected
    pub passengers: Vec<Passenger>,
    /// Payment method
    pub payment_method: String,
    /// Ticket language
    pub language: Language,
}

impl SaleForm {
    /// Empty form dated `today`.
    #[must_use]
    pub fn blank(today: NaiveDate) -> Self {
        Self {
            schedule_id: None,
            schedule_date: Some(today),
            selected_seats: Vec::new(),
            passengers: vec![Passenger::default()],
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
            language: Language::default(),
        }
    }

    /// Make the passenger count match the seat count (at least one form).
    /// Retained forms keep their data; new ones are blank; extra ones are
    /// dropped from the end.
    pub(crate) fn align_passengers(&mut self) {
        let wanted = self.selected_seats.len().max(1);
        self.passengers.resize_with(wanted, Passenger::default);
    }
}

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Operation succeeded
    Success,
    /// Something changed that the agent should know about
    Warning,
    /// Operation failed or was rejected
    Error,
}

/// Latest user-facing message of the dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Message text
    pub message: String,
}

impl Notice {
    /// Success notice.
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    /// Warning notice.
    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    /// Error notice.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Coarse phase, derived from the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SalePhase {
    /// Dialog not shown
    Closed,
    /// No schedule/date chosen
    Idle,
    /// Waiting for availability
    SeatsLoading,
    /// Schedule and date chosen, no seat yet
    CriteriaSelected,
    /// At least one seat chosen
    SeatsSelected,
    /// Sale request in flight
    Submitting,
}

/// Complete state of one agent's sale dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleState {
    /// Whether the dialog is shown
    pub open: bool,
    /// Form fields
    pub form: SaleForm,
    /// Seats free for the chosen schedule and date, ascending
    pub available_seats: Vec<SeatNumber>,
    /// Availability fetch in flight
    pub seats_loading: bool,
    /// Last availability fetch failed
    pub seat_error: Option<String>,
    /// Validation errors by passenger index
    pub passenger_errors: BTreeMap<usize, PassengerErrors>,
    /// Payment methods to offer
    pub payment_methods: Vec<String>,
    /// Sale request in flight
    pub submitting: bool,
    /// Latest message for the agent
    pub notice: Option<Notice>,
    /// Id of the only availability result that may still be applied
    #[serde(skip)]
    pub pending_seat_request: Option<u64>,
    /// Last issued availability request id; never reset
    #[serde(skip)]
    pub last_request_id: u64,
}

impl SaleState {
    /// Closed dialog with a blank form dated `today`.
    #[must_use]
    pub fn idle(today: NaiveDate) -> Self {
        Self {
            open: false,
            form: SaleForm::blank(today),
            available_seats: Vec::new(),
            seats_loading: false,
            seat_error: None,
            passenger_errors: BTreeMap::new(),
            payment_methods: default_payment_methods(),
            submitting: false,
            notice: None,
            pending_seat_request: None,
            last_request_id: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> SalePhase {
        if !self.open {
            SalePhase::Closed
        } else if self.submitting {
            SalePhase::Submitting
        } else if self.seats_loading {
            SalePhase::SeatsLoading
        } else if !self.form.selected_seats.is_empty() {
            SalePhase::SeatsSelected
        } else if self.form.schedule_id.is_some() && self.form.schedule_date.is_some() {
            SalePhase::CriteriaSelected
        } else {
            SalePhase::Idle
        }
    }

    /// Whether seats may be picked: availability loaded, non-empty and not failed.
    #[must_use]
    pub fn seat_picker_enabled(&self) -> bool {
        !self.seats_loading && self.seat_error.is_none() && !self.available_seats.is_empty()
    }

    /// Back to the blank form. Dialog visibility, the notice, the payment
    /// method list and the request counter are kept, so resetting twice is
    /// the same as resetting once.
    pub fn reset_form(&mut self, today: NaiveDate) {
        self.form = SaleForm::blank(today);
        self.available_seats.clear();
        self.seats_loading = false;
        self.seat_error = None;
        self.passenger_errors.clear();
        self.submitting = false;
        self.pending_seat_request = None;
    }
}

//! The sale reducer.
//!
//! Couples seat selection to passenger forms, guards availability results
//! against out-of-order arrival and turns a valid form into one atomic
//! [`SaleRequest`]. All I/O leaves as effects; notices and the "tickets sold"
//! signal go out through the [`SaleListener`].

use super::action::{SaleAction, SaleFailure};
use super::state::{MAX_SEATS_PER_SALE, Notice, SaleState};
use super::validation::validate_passengers;
use crate::api::SalesApi;
use crate::types::{SaleRequest, SeatNumber};
use busdesk_core::{SmallVec, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use chrono::NaiveDate;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

type Effects = SmallVec<[Effect<SaleAction>; 4]>;

// ============================================================================
// Outputs
// ============================================================================

/// Why a seat change or submission was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleRejection {
    /// Submit without a schedule
    MissingSchedule,
    /// Submit without a date
    MissingDate,
    /// Submit without seats
    NoSeats,
    /// Submit with invalid passenger data
    InvalidPassengers,
    /// A sixth seat
    SeatLimit,
    /// A seat outside the current availability
    SeatUnavailable(SeatNumber),
    /// Seat change while availability is loading, failed or empty
    PickerDisabled,
}

impl fmt::Display for SaleRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSchedule => f.write_str("Please choose a route"),
            Self::MissingDate => f.write_str("Please choose a date"),
            Self::NoSeats => f.write_str("Please choose at least one seat"),
            Self::InvalidPassengers => f.write_str("Please fill in the passenger details correctly"),
            Self::SeatLimit => write!(f, "At most {MAX_SEATS_PER_SALE} tickets can be sold at once"),
            Self::SeatUnavailable(seat) => write!(f, "Seat {seat} is not available"),
            Self::PickerDisabled => f.write_str("Seats are not available for selection yet"),
        }
    }
}

/// Signals for the surrounding shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaleEvent {
    /// A message to show the agent
    Notice(Notice),
    /// A sale went through; ticket lists should be refreshed
    TicketsSold {
        /// Tickets created
        count: usize,
    },
    /// The backend ended the session; the agent must sign in again
    SessionEnded,
}

/// Receives [`SaleEvent`]s.
pub trait SaleListener: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: SaleEvent);
}

// ============================================================================
// Environment
// ============================================================================

/// Dependencies of the sale reducer.
#[derive(Clone)]
pub struct SaleEnvironment {
    /// Backend operations
    pub api: Arc<dyn SalesApi>,
    /// Source of "today"
    pub clock: Arc<dyn Clock>,
    /// Receiver of notices and completion signals
    pub listener: Arc<dyn SaleListener>,
    /// Delay between closing and clearing the form; zero clears immediately
    pub reset_delay: Duration,
}

impl SaleEnvironment {
    /// Creates a new `SaleEnvironment`
    #[must_use]
    pub fn new(
        api: Arc<dyn SalesApi>,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn SaleListener>,
        reset_delay: Duration,
    ) -> Self {
        Self {
            api,
            clock,
            listener,
            reset_delay,
        }
    }

    fn today(&self) -> NaiveDate {
        self.clock.now().date_naive()
    }
}

impl fmt::Debug for SaleEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaleEnvironment")
            .field("reset_delay", &self.reset_delay)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the sale dialog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaleReducer;

impl SaleReducer {
    /// Creates a new `SaleReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn emit(env: &SaleEnvironment, event: SaleEvent) -> Effect<SaleAction> {
        let listener = Arc::clone(&env.listener);
        Effect::future(async move {
            listener.on_event(event);
            None
        })
    }

    fn notify(state: &mut SaleState, env: &SaleEnvironment, notice: Notice) -> Effect<SaleAction> {
        state.notice = Some(notice.clone());
        Self::emit(env, SaleEvent::Notice(notice))
    }

    fn reject(state: &mut SaleState, env: &SaleEnvironment, rejection: SaleRejection) -> Effects {
        tracing::debug!(?rejection, "Sale input rejected");
        smallvec![Self::notify(state, env, Notice::error(rejection.to_string()))]
    }

    /// Start an availability fetch for the current criteria, or clear
    /// availability when the criteria are incomplete.
    fn refresh_seats(state: &mut SaleState, env: &SaleEnvironment) -> Effects {
        let (Some(schedule_id), Some(date)) = (state.form.schedule_id, state.form.schedule_date)
        else {
            state.available_seats.clear();
            state.pending_seat_request = None;
            state.seats_loading = false;
            return SmallVec::new();
        };

        state.last_request_id += 1;
        let request_id = state.last_request_id;
        state.pending_seat_request = Some(request_id);
        state.seats_loading = true;
        state.seat_error = None;

        tracing::debug!(schedule_id, %date, request_id, "Loading available seats");
        let fetch = env.api.available_seats(schedule_id, date);
        smallvec![Effect::future(async move {
            let result = fetch
                .await
                .map_err(|e| SaleFailure::from_api(&e, "Could not load available seats"));
            Some(SaleAction::SeatsLoaded { request_id, result })
        })]
    }

    /// Hide the dialog and discard late results; clear the form now or after
    /// the reset delay.
    fn close(state: &mut SaleState, env: &SaleEnvironment) -> Effects {
        state.open = false;
        state.pending_seat_request = None;
        if env.reset_delay.is_zero() {
            state.reset_form(env.today());
            SmallVec::new()
        } else {
            smallvec![Effect::delay(env.reset_delay, SaleAction::FinishClose)]
        }
    }

    /// The backend ended the session: close and clear without a local error.
    fn end_session(state: &mut SaleState, env: &SaleEnvironment) -> Effects {
        tracing::info!("Session ended during sale, closing dialog");
        state.open = false;
        state.notice = None;
        state.reset_form(env.today());
        smallvec![Self::emit(env, SaleEvent::SessionEnded)]
    }

    /// Remove the seat at `index` together with its passenger form and
    /// shift later validation errors down.
    fn remove_seat_at(state: &mut SaleState, index: usize) {
        state.form.selected_seats.remove(index);
        if index < state.form.passengers.len() {
            state.form.passengers.remove(index);
        }
        state.form.align_passengers();

        state.passenger_errors = std::mem::take(&mut state.passenger_errors)
            .into_iter()
            .filter(|(i, _)| *i != index)
            .map(|(i, errors)| if i > index { (i - 1, errors) } else { (i, errors) })
            .collect();
    }

    fn apply_seats_loaded(
        state: &mut SaleState,
        env: &SaleEnvironment,
        mut seats: Vec<SeatNumber>,
    ) -> Effects {
        seats.sort_unstable();
        seats.dedup();
        state.available_seats = seats;

        let mut dropped = Vec::new();
        let mut index = 0;
        while index < state.form.selected_seats.len() {
            let seat = state.form.selected_seats[index];
            if state.available_seats.binary_search(&seat).is_ok() {
                index += 1;
            } else {
                Self::remove_seat_at(state, index);
                dropped.push(seat.to_string());
            }
        }

        if dropped.is_empty() {
            return SmallVec::new();
        }
        tracing::debug!(?dropped, "Selected seats no longer available");
        smallvec![Self::notify(
            state,
            env,
            Notice::warning(format!("Seats no longer available: {}", dropped.join(", ")))
        )]
    }

    fn toggle_seat(state: &mut SaleState, env: &SaleEnvironment, seat: SeatNumber) -> Effects {
        if !state.seat_picker_enabled() {
            return Self::reject(state, env, SaleRejection::PickerDisabled);
        }

        if let Some(index) = state.form.selected_seats.iter().position(|s| *s == seat) {
            Self::remove_seat_at(state, index);
            return SmallVec::new();
        }

        if state.available_seats.binary_search(&seat).is_err() {
            return Self::reject(state, env, SaleRejection::SeatUnavailable(seat));
        }
        if state.form.selected_seats.len() >= MAX_SEATS_PER_SALE {
            return Self::reject(state, env, SaleRejection::SeatLimit);
        }

        state.form.selected_seats.push(seat);
        state.form.align_passengers();
        SmallVec::new()
    }

    fn replace_seats(
        state: &mut SaleState,
        env: &SaleEnvironment,
        seats: Vec<SeatNumber>,
    ) -> Effects {
        if !state.seat_picker_enabled() {
            return Self::reject(state, env, SaleRejection::PickerDisabled);
        }

        let mut unique = Vec::with_capacity(seats.len());
        for seat in seats {
            if !unique.contains(&seat) {
                unique.push(seat);
            }
        }

        if unique.len() > MAX_SEATS_PER_SALE {
            return Self::reject(state, env, SaleRejection::SeatLimit);
        }
        if let Some(seat) = unique
            .iter()
            .find(|seat| state.available_seats.binary_search(seat).is_err())
        {
            return Self::reject(state, env, SaleRejection::SeatUnavailable(*seat));
        }

        state.form.selected_seats = unique;
        state.form.align_passengers();
        let count = state.form.passengers.len();
        state.passenger_errors.retain(|index, _| *index < count);
        SmallVec::new()
    }

    /// Guards in order: schedule, date, seats, passengers.
    fn submit(state: &mut SaleState, env: &SaleEnvironment) -> Effects {
        if state.submitting {
            return SmallVec::new();
        }

        let Some(schedule_id) = state.form.schedule_id else {
            return Self::reject(state, env, SaleRejection::MissingSchedule);
        };
        let Some(date) = state.form.schedule_date else {
            return Self::reject(state, env, SaleRejection::MissingDate);
        };
        if state.form.selected_seats.is_empty() {
            return Self::reject(state, env, SaleRejection::NoSeats);
        }

        state.passenger_errors = validate_passengers(&state.form.passengers);
        if !state.passenger_errors.is_empty() {
            return Self::reject(state, env, SaleRejection::InvalidPassengers);
        }

        let Some(request) = SaleRequest::new(
            schedule_id,
            date,
            &state.form.selected_seats,
            &state.form.passengers,
            state.form.payment_method.clone(),
            state.form.language,
        ) else {
            tracing::error!(
                seats = state.form.selected_seats.len(),
                passengers = state.form.passengers.len(),
                "Seats and passengers out of step"
            );
            return smallvec![Self::notify(
                state,
                env,
                Notice::error("Failed to sell tickets")
            )];
        };

        state.submitting = true;
        tracing::info!(schedule_id, %date, tickets = request.ticket_count, "Submitting sale");
        let sale = env.api.sell_tickets(request);
        smallvec![Effect::future(async move {
            let result = sale
                .await
                .map_err(|e| SaleFailure::from_api(&e, "Failed to sell tickets"));
            Some(SaleAction::SaleCompleted(result))
        })]
    }
}

impl Reducer for SaleReducer {
    type State = SaleState;
    type Action = SaleAction;
    type Environment = SaleEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Dialog lifecycle ==========
            SaleAction::Open => {
                state.open = true;
                state.notice = None;
                state.reset_form(env.today());

                let methods = env.api.payment_methods();
                smallvec![Effect::future(async move {
                    let result = methods
                        .await
                        .map_err(|e| SaleFailure::from_api(&e, "Could not load payment methods"));
                    Some(SaleAction::PaymentMethodsLoaded(result))
                })]
            },

            SaleAction::Close => Self::close(state, env),

            SaleAction::FinishClose => {
                // Reopened in the meantime: Open already reset the form.
                if !state.open {
                    state.reset_form(env.today());
                }
                SmallVec::new()
            },

            SaleAction::ResetForm => {
                state.reset_form(env.today());
                SmallVec::new()
            },

            // ========== Criteria ==========
            SaleAction::SelectSchedule(schedule_id) => {
                state.form.schedule_id = schedule_id;
                Self::refresh_seats(state, env)
            },

            SaleAction::SelectDate(date) => {
                state.form.schedule_date = date;
                Self::refresh_seats(state, env)
            },

            SaleAction::SeatsLoaded { request_id, result } => {
                if state.pending_seat_request != Some(request_id) {
                    tracing::debug!(request_id, "Discarding stale seat availability");
                    return SmallVec::new();
                }
                state.pending_seat_request = None;
                state.seats_loading = false;

                match result {
                    Ok(seats) => Self::apply_seats_loaded(state, env, seats),
                    Err(failure) if failure.session_expired => Self::end_session(state, env),
                    Err(failure) => {
                        // Selection is kept; the picker stays disabled until a fetch succeeds.
                        state.available_seats.clear();
                        state.seat_error = Some(failure.message.clone());
                        smallvec![Self::notify(state, env, Notice::warning(failure.message))]
                    },
                }
            },

            // ========== Seats and passengers ==========
            SaleAction::ToggleSeat(seat) => Self::toggle_seat(state, env, seat),

            SaleAction::ReplaceSeats(seats) => Self::replace_seats(state, env, seats),

            SaleAction::UpdatePassenger {
                index,
                field,
                value,
            } => {
                if let Some(passenger) = state.form.passengers.get_mut(index) {
                    *field.value_mut(passenger) = value;
                    if let Some(errors) = state.passenger_errors.get_mut(&index) {
                        errors.remove(&field);
                        if errors.is_empty() {
                            state.passenger_errors.remove(&index);
                        }
                    }
                }
                SmallVec::new()
            },

            SaleAction::CopyFirstPassenger { index } => {
                if index > 0 && index < state.form.passengers.len() {
                    state.form.passengers[index] = state.form.passengers[0].clone();
                }
                SmallVec::new()
            },

            SaleAction::SetPaymentMethod(method) => {
                state.form.payment_method = method;
                SmallVec::new()
            },

            SaleAction::SetLanguage(language) => {
                state.form.language = language;
                SmallVec::new()
            },

            SaleAction::PaymentMethodsLoaded(result) => match result {
                Ok(methods) => {
                    state.payment_methods = methods;
                    SmallVec::new()
                },
                Err(failure) if failure.session_expired => Self::end_session(state, env),
                // The client already fell back to defaults for anything else.
                Err(_) => SmallVec::new(),
            },

            // ========== Submission ==========
            SaleAction::Submit => Self::submit(state, env),

            SaleAction::SaleCompleted(result) => {
                state.submitting = false;
                match result {
                    Ok(confirmation) => {
                        let count = confirmation.ticket_count;
                        tracing::info!(count, "Sale completed");
                        metrics::counter!("sale.tickets_sold")
                            .increment(u64::try_from(count).unwrap_or(u64::MAX));

                        let mut effects = smallvec![
                            Self::notify(
                                state,
                                env,
                                Notice::success(format!("Successfully sold {count} tickets!"))
                            ),
                            Self::emit(env, SaleEvent::TicketsSold { count }),
                        ];
                        effects.extend(Self::close(state, env));
                        effects
                    },
                    Err(failure) if failure.session_expired => Self::end_session(state, env),
                    Err(failure) => {
                        tracing::warn!(message = %failure.message, "Sale failed");
                        smallvec![Self::notify(state, env, Notice::error(failure.message))]
                    },
                }
            },
        }
    }
}

//! Seat-bound multi-ticket sale workflow.
//!
//! The dialog is a reducer: [`SaleState`] + [`SaleAction`] → state change and
//! effects. The HTTP shell runs one [`busdesk_runtime::Store`] per signed-in
//! agent.

pub mod action;
pub mod reducer;
pub mod seats;
pub mod state;
pub mod validation;

pub use action::{SaleAction, SaleFailure};
pub use reducer::{SaleEnvironment, SaleEvent, SaleListener, SaleReducer, SaleRejection};
pub use state::{MAX_SEATS_PER_SALE, Notice, NoticeLevel, SaleForm, SalePhase, SaleState};
pub use validation::{PassengerErrors, PassengerField, validate_passenger, validate_passengers};

/// A running sale dialog.
pub type SaleStore = busdesk_runtime::Store<SaleState, SaleAction, SaleEnvironment, SaleReducer>;

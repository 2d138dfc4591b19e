//! # Busdesk Testing
//!
//! Helpers for testing reducers without a running store:
//!
//! - [`FixedClock`] pins "now" so date defaults are reproducible
//! - [`ReducerTest`] runs a Given-When-Then scenario against a reducer
//! - [`resolve_effects`] and [`assertions`] inspect what a reducer returned
//!
//! ## Example
//!
//! ```ignore
//! use busdesk_testing::{ReducerTest, test_clock};
//!
//! ReducerTest::new(SaleReducer::new())
//!     .with_env(environment_with(test_clock()))
//!     .given_state(SaleState::idle(today))
//!     .when_action(SaleAction::ToggleSeat(SeatNumber(3)))
//!     .then_state(|s| assert_eq!(s.form.selected_seats.len(), 1))
//!     .run();
//! ```

pub mod clock;
pub mod effects;
pub mod reducer_test;

pub use clock::{FixedClock, test_clock};
pub use effects::{assertions, resolve_effects};
pub use reducer_test::ReducerTest;


//! Role-based access control.
//!
//! [`gate::decide`] is the pure decision function, [`menu::menu_for`] the
//! matching sidebar, and [`middleware::access_gate`] applies both to HTTP
//! requests.

pub mod gate;
pub mod menu;
pub mod middleware;

pub use gate::{AccessDecision, decide, landing_page};
pub use menu::{MenuItem, menu_for};
pub use middleware::{Gatekeeper, access_gate};

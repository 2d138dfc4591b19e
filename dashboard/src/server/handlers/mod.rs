//! HTTP handlers. Dashboard handlers read the [`crate::types::Principal`]
//! the gate put into the request extensions.

pub mod admin;
pub mod customers;
pub mod driver;
pub mod overview;
pub mod sales;
pub mod session;

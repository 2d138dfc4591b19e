//! # Busdesk
//!
//! Back-office dashboard for a bus ticketing service.
//!
//! - [`access`]: which role may open which path, enforced by a middleware
//! - [`session`]: signed session tokens and the forced sign-out latch
//! - [`api`]: typed client for the ticketing REST backend
//! - [`sale`]: the multi-seat sale dialog as a reducer
//! - [`server`]: the Axum shell tying them together
//!
//! ## Example
//!
//! ```ignore
//! use busdesk::{config::Config, server::{AppState, build_router}};
//! use busdesk_core::environment::SystemClock;
//! use std::sync::Arc;
//!
//! let state = AppState::new(Config::from_env(), Arc::new(SystemClock))?;
//! let app = build_router(state);
//! ```

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod access;
pub mod api;
pub mod config;
pub mod sale;
pub mod server;
pub mod session;
pub mod types;

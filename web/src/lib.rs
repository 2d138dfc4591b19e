//! HTTP plumbing shared by busdesk services.
//!
//! Decisions live in pure code (the access gate, the sale reducer); this
//! crate only carries them over HTTP:
//!
//! - [`AppError`]: status, stable code and user message as a JSON body
//! - [`correlation_id_layer`]: one ID per request in logs and responses
//! - [`BearerToken`] and [`CorrelationId`] extractors
//! - [`handlers::health_check`] for probes

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;

pub use error::AppError;
pub use extractors::{BearerToken, CorrelationId};
pub use middleware::{CORRELATION_ID_HEADER, correlation_id_layer};

//! HTTP handlers shared by every busdesk service.

pub mod health;

pub use health::health_check;

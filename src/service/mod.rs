//! Service layer for the ranked room coordinator
//!
//! Application state, lifecycle and health reporting.

pub mod app;
pub mod health;

pub use app::{AppState, ServiceError};
pub use health::{ComponentCheck, HealthCheck, HealthProbe, HealthStatus};

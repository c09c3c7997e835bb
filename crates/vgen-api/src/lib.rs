//! Axum HTTP host for the generation job reconciler.
//!
//! This crate provides:
//! - The bearer-protected cron trigger that runs a reconciliation pass
//! - Liveness and readiness probes
//! - An optional internal schedule
//! - Rate limiting, security headers and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use routes::{create_router, CRON_POLL_PATH};
pub use services::ReconcileScheduler;
pub use state::{AppState, DependencyCheck};

//! Request handlers.

pub mod cron;
pub mod health;

pub use cron::poll;
pub use health::{health, ready};

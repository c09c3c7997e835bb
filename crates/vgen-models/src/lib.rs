//! Shared data models for the video generation backend.
//!
//! This crate provides Serde-serializable types for:
//! - Generation jobs and their identifiers
//! - Job status and the terminal-state rules
//! - Provider poll outcomes
//! - Reconciliation pass summaries

pub mod job;
pub mod job_status;
pub mod poll;
pub mod summary;

// Re-export common types
pub use job::{BatchId, Job, JobId, JobUpdate, OwnerId};
pub use job_status::{JobStatus, ParseJobStatusError};
pub use poll::PollOutcome;
pub use summary::PassSummary;

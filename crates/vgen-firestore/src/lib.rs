//! Firestore REST API client.
//!
//! This crate provides:
//! - Job repository for generation job records (discovery, status reads,
//!   conditional status writes)
//! - Profile repository for owner contact addresses
//! - Service account authentication via gcp_auth
//! - Optimistic concurrency through `updateTime` preconditions and retry logic

pub mod client;
pub mod error;
pub mod job_repo;
pub mod metrics;
pub mod profile_repo;
pub mod retry;
pub mod token_cache;
pub mod types;

#[cfg(test)]
mod job_repo_tests;

pub use client::{FirestoreClient, FirestoreConfig, Precondition};
pub use error::{FirestoreError, FirestoreResult};
pub use job_repo::{JobRepository, JOBS_COLLECTION};
pub use profile_repo::{ProfileRepository, PROFILES_COLLECTION};
pub use types::{Document, FromFirestoreValue, ToFirestoreValue, Value};

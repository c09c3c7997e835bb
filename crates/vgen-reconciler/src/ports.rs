//! Collaborators the reconciler drives.
//!
//! Production wiring lives in [`crate::adapters`]; tests use in-memory doubles.

use async_trait::async_trait;

use vgen_models::{Job, JobId, JobStatus, JobUpdate, OwnerId, PollOutcome};

use crate::error::ReconcileResult;

/// Persistent job records.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Jobs in any of `statuses` that carry a provider operation handle.
    async fn list_jobs_by_status_with_operation_ref(
        &self,
        statuses: &[JobStatus],
    ) -> ReconcileResult<Vec<Job>>;

    /// Current status, `None` if the job no longer exists.
    async fn get_job_status(&self, id: &JobId) -> ReconcileResult<Option<JobStatus>>;

    /// Apply `update` only while the job is pending or processing.
    ///
    /// Returns whether the write was applied.
    async fn update_job_status(&self, id: &JobId, update: JobUpdate) -> ReconcileResult<bool>;

    /// Set `notified` on a completed job.
    async fn mark_notified(&self, id: &JobId) -> ReconcileResult<()>;

    /// Where to send the owner's completion notice.
    async fn get_owner_contact(&self, owner_id: &OwnerId) -> ReconcileResult<Option<String>>;
}

/// Remote video generation service.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn poll_operation(&self, operation_ref: &str) -> ReconcileResult<PollOutcome>;

    async fn fetch_result_bytes(&self, location: &str) -> ReconcileResult<Vec<u8>>;
}

/// Result of a create-only write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOutcome {
    /// This call wrote the object.
    Created(String),
    /// An object was already stored under the name and was left untouched.
    AlreadyExists(String),
}

impl StoreOutcome {
    pub fn path(&self) -> &str {
        match self {
            StoreOutcome::Created(path) | StoreOutcome::AlreadyExists(path) => path,
        }
    }
}

/// Blob storage for finished videos.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `bytes` under `name` without overwriting.
    async fn store(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> ReconcileResult<StoreOutcome>;

    /// Durable public URL for a stored object.
    async fn public_url(&self, path: &str) -> ReconcileResult<String>;
}

/// Sends completion notices.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_completion_notice(&self, address: &str, owner_id: &OwnerId) -> ReconcileResult<()>;
}

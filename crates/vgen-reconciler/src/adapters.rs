//! Port implementations over the production clients.

use async_trait::async_trait;

use vgen_firestore::{FirestoreClient, JobRepository, ProfileRepository};
use vgen_models::{Job, JobId, JobStatus, JobUpdate, OwnerId, PollOutcome};
use vgen_notify::EmailClient;
use vgen_provider::VeoClient;
use vgen_storage::{R2Client, StorageError};

use crate::error::ReconcileResult;
use crate::ports::{ArtifactStore, GenerationProvider, JobStore, Notifier, StoreOutcome};

/// Job store backed by the `video_items` and `profiles` collections.
#[derive(Clone)]
pub struct FirestoreJobStore {
    jobs: JobRepository,
    profiles: ProfileRepository,
}

impl FirestoreJobStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self {
            jobs: JobRepository::new(client.clone()),
            profiles: ProfileRepository::new(client),
        }
    }
}

#[async_trait]
impl JobStore for FirestoreJobStore {
    async fn list_jobs_by_status_with_operation_ref(
        &self,
        statuses: &[JobStatus],
    ) -> ReconcileResult<Vec<Job>> {
        Ok(self.jobs.list_active_with_operation_ref(statuses).await?)
    }

    async fn get_job_status(&self, id: &JobId) -> ReconcileResult<Option<JobStatus>> {
        Ok(self.jobs.get_status(id).await?)
    }

    async fn update_job_status(&self, id: &JobId, update: JobUpdate) -> ReconcileResult<bool> {
        Ok(self.jobs.update_if_active(id, &update).await?)
    }

    async fn mark_notified(&self, id: &JobId) -> ReconcileResult<()> {
        Ok(self.jobs.mark_notified(id).await?)
    }

    async fn get_owner_contact(&self, owner_id: &OwnerId) -> ReconcileResult<Option<String>> {
        Ok(self.profiles.get_email(owner_id).await?)
    }
}

#[async_trait]
impl GenerationProvider for VeoClient {
    async fn poll_operation(&self, operation_ref: &str) -> ReconcileResult<PollOutcome> {
        Ok(VeoClient::poll_operation(self, operation_ref).await?)
    }

    async fn fetch_result_bytes(&self, location: &str) -> ReconcileResult<Vec<u8>> {
        Ok(VeoClient::fetch_result_bytes(self, location).await?)
    }
}

#[async_trait]
impl ArtifactStore for R2Client {
    async fn store(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> ReconcileResult<StoreOutcome> {
        match self.put_if_absent(name, bytes, content_type).await {
            Ok(()) => Ok(StoreOutcome::Created(name.to_string())),
            Err(StorageError::AlreadyExists(key)) => Ok(StoreOutcome::AlreadyExists(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn public_url(&self, path: &str) -> ReconcileResult<String> {
        Ok(R2Client::public_url(self, path))
    }
}

#[async_trait]
impl Notifier for EmailClient {
    async fn send_completion_notice(&self, address: &str, owner_id: &OwnerId) -> ReconcileResult<()> {
        Ok(EmailClient::send_completion_notice(self, address, owner_id).await?)
    }
}

//! In-memory doubles for the reconciler ports.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use vgen_firestore::FirestoreError;
use vgen_models::{Job, JobId, JobStatus, JobUpdate, OwnerId, PollOutcome};
use vgen_notify::NotifyError;
use vgen_provider::ProviderError;
use vgen_reconciler::{
    ArtifactStore, GenerationProvider, JobStore, Notifier, ReconcileResult, Reconciler,
    ReconcilerConfig, StoreOutcome,
};
use vgen_storage::StorageError;

// =============================================================================
// Job store
// =============================================================================

#[derive(Default)]
pub struct MemoryJobStore {
    jobs: Mutex<HashMap<JobId, Job>>,
    contacts: Mutex<HashMap<OwnerId, String>>,
    /// Returned by discovery instead of the live records when set
    snapshot: Mutex<Option<Vec<Job>>>,
    pub fail_discovery: AtomicBool,
    pub fail_updates: AtomicBool,
    pub update_calls: AtomicUsize,
    pub applied_updates: AtomicUsize,
}

impl MemoryJobStore {
    pub fn insert(&self, job: Job) {
        self.jobs.lock().unwrap().insert(job.id.clone(), job);
    }

    pub fn set_contact(&self, owner: &OwnerId, address: &str) {
        self.contacts
            .lock()
            .unwrap()
            .insert(owner.clone(), address.to_string());
    }

    pub fn set_snapshot(&self, jobs: Vec<Job>) {
        *self.snapshot.lock().unwrap() = Some(jobs);
    }

    pub fn set_status(&self, id: &JobId, status: JobStatus) {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.status = status;
        }
    }

    pub fn job(&self, id: &JobId) -> Job {
        self.jobs.lock().unwrap()[id].clone()
    }

    pub fn all(&self) -> Vec<Job> {
        self.jobs.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn list_jobs_by_status_with_operation_ref(
        &self,
        statuses: &[JobStatus],
    ) -> ReconcileResult<Vec<Job>> {
        if self.fail_discovery.load(Ordering::SeqCst) {
            return Err(FirestoreError::from_http_status(503, "backend unavailable").into());
        }
        if let Some(snapshot) = self.snapshot.lock().unwrap().clone() {
            return Ok(snapshot);
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .values()
            .filter(|j| statuses.contains(&j.status) && j.provider_operation_ref.is_some())
            .cloned()
            .collect())
    }

    async fn get_job_status(&self, id: &JobId) -> ReconcileResult<Option<JobStatus>> {
        Ok(self.jobs.lock().unwrap().get(id).map(|j| j.status))
    }

    async fn update_job_status(&self, id: &JobId, update: JobUpdate) -> ReconcileResult<bool> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(FirestoreError::request_failed("write rejected").into());
        }

        let mut jobs = self.jobs.lock().unwrap();
        match jobs.get_mut(id) {
            Some(job) if job.status.is_active() => {
                job.apply(&update, Utc::now());
                self.applied_updates.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_notified(&self, id: &JobId) -> ReconcileResult<()> {
        if let Some(job) = self.jobs.lock().unwrap().get_mut(id) {
            job.notified = true;
        }
        Ok(())
    }

    async fn get_owner_contact(&self, owner_id: &OwnerId) -> ReconcileResult<Option<String>> {
        Ok(self.contacts.lock().unwrap().get(owner_id).cloned())
    }
}

// =============================================================================
// Provider
// =============================================================================

#[derive(Default)]
pub struct FakeProvider {
    outcomes: Mutex<HashMap<String, PollOutcome>>,
    failing: Mutex<HashSet<String>>,
    pub polled: Mutex<Vec<String>>,
    pub fetch_calls: AtomicUsize,
    pub poll_delay: Mutex<Option<Duration>>,
    pub fetch_delay: Mutex<Option<Duration>>,
}

impl FakeProvider {
    pub fn set_outcome(&self, operation_ref: &str, outcome: PollOutcome) {
        self.outcomes
            .lock()
            .unwrap()
            .insert(operation_ref.to_string(), outcome);
    }

    pub fn fail_poll(&self, operation_ref: &str) {
        self.failing.lock().unwrap().insert(operation_ref.to_string());
    }

    pub fn poll_count(&self) -> usize {
        self.polled.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationProvider for FakeProvider {
    async fn poll_operation(&self, operation_ref: &str) -> ReconcileResult<PollOutcome> {
        self.polled.lock().unwrap().push(operation_ref.to_string());
        let delay = *self.poll_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.lock().unwrap().contains(operation_ref) {
            return Err(ProviderError::Status {
                status: 500,
                body: "internal".to_string(),
            }
            .into());
        }
        Ok(self
            .outcomes
            .lock()
            .unwrap()
            .get(operation_ref)
            .cloned()
            .unwrap_or(PollOutcome::Pending))
    }

    async fn fetch_result_bytes(&self, location: &str) -> ReconcileResult<Vec<u8>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(format!("video:{}", location).into_bytes())
    }
}

// =============================================================================
// Artifact store
// =============================================================================

pub const PUBLIC_BASE: &str = "https://videos.test";

#[derive(Default)]
pub struct MemoryArtifacts {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    pub store_calls: AtomicUsize,
    pub created: AtomicUsize,
    pub fail_store: AtomicBool,
}

impl MemoryArtifacts {
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn content_type(&self, key: &str) -> Option<String> {
        self.objects.lock().unwrap().get(key).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifacts {
    async fn store(&self, name: &str, bytes: Vec<u8>, content_type: &str) -> ReconcileResult<StoreOutcome> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(StorageError::upload_failed("bucket unavailable").into());
        }

        let mut objects = self.objects.lock().unwrap();
        if objects.contains_key(name) {
            return Ok(StoreOutcome::AlreadyExists(name.to_string()));
        }
        objects.insert(name.to_string(), (bytes, content_type.to_string()));
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(StoreOutcome::Created(name.to_string()))
    }

    async fn public_url(&self, path: &str) -> ReconcileResult<String> {
        Ok(format!("{}/{}", PUBLIC_BASE, path))
    }
}

// =============================================================================
// Notifier
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, OwnerId)>>,
    pub attempts: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_completion_notice(&self, address: &str, owner_id: &OwnerId) -> ReconcileResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected {
                status: 500,
                body: "mail server down".to_string(),
            }
            .into());
        }
        self.sent
            .lock()
            .unwrap()
            .push((address.to_string(), owner_id.clone()));
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub store: Arc<MemoryJobStore>,
    pub provider: Arc<FakeProvider>,
    pub artifacts: Arc<MemoryArtifacts>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryJobStore::default()),
            provider: Arc::new(FakeProvider::default()),
            artifacts: Arc::new(MemoryArtifacts::default()),
            notifier: Arc::new(RecordingNotifier::default()),
        }
    }

    pub fn reconciler(&self) -> Reconciler {
        self.reconciler_with(ReconcilerConfig::default())
    }

    /// A fresh reconciler over the same doubles, as another process would be.
    pub fn reconciler_with(&self, config: ReconcilerConfig) -> Reconciler {
        Reconciler::new(
            self.store.clone(),
            self.provider.clone(),
            self.artifacts.clone(),
            self.notifier.clone(),
            config,
        )
    }
}

/// An active job created `minutes_ago`, with operation `operations/{tag}`.
pub fn job_aged(tag: &str, owner: &str, status: JobStatus, minutes_ago: i64) -> Job {
    let mut job = Job::new_pending(
        "batch-1",
        owner,
        format!("https://images.test/{}.png", tag),
        Some(operation_ref(tag)),
    );
    job.id = JobId::from(format!("job-{}", tag));
    job.status = status;
    job.created_at = Utc::now() - chrono::Duration::minutes(minutes_ago);
    job.updated_at = job.created_at;
    job
}

pub fn operation_ref(tag: &str) -> String {
    format!("models/veo-3.0-fast-generate-001/operations/{}", tag)
}

pub fn succeeded(tag: &str) -> PollOutcome {
    PollOutcome::Succeeded {
        result_location: format!("https://files.test/{}.mp4", tag),
    }
}

//! Port doubles and router helpers for API tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Response;
use axum::Router;
use chrono::Utc;

use vgen_api::{create_router, AppConfig, AppState, DependencyCheck};
use vgen_firestore::FirestoreError;
use vgen_models::{Job, JobId, JobStatus, JobUpdate, OwnerId, PollOutcome};
use vgen_reconciler::{
    ArtifactStore, GenerationProvider, JobStore, Notifier, ReconcileResult, Reconciler,
    StoreOutcome,
};

pub const SECRET: &str = "cron-s3cret";

#[derive(Default)]
pub struct StubStore {
    pub jobs: Mutex<Vec<Job>>,
    pub list_calls: AtomicUsize,
    pub fail_discovery: AtomicBool,
}

#[async_trait]
impl JobStore for StubStore {
    async fn list_jobs_by_status_with_operation_ref(
        &self,
        statuses: &[JobStatus],
    ) -> ReconcileResult<Vec<Job>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_discovery.load(Ordering::SeqCst) {
            return Err(FirestoreError::from_http_status(503, "backend unavailable").into());
        }
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| statuses.contains(&j.status))
            .cloned()
            .collect())
    }

    async fn get_job_status(&self, id: &JobId) -> ReconcileResult<Option<JobStatus>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| &j.id == id)
            .map(|j| j.status))
    }

    async fn update_job_status(&self, id: &JobId, update: JobUpdate) -> ReconcileResult<bool> {
        let mut jobs = self.jobs.lock().unwrap();
        match jobs.iter_mut().find(|j| &j.id == id) {
            Some(job) if job.status.is_active() => {
                job.apply(&update, Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_notified(&self, _id: &JobId) -> ReconcileResult<()> {
        Ok(())
    }

    async fn get_owner_contact(&self, _owner_id: &OwnerId) -> ReconcileResult<Option<String>> {
        Ok(None)
    }
}

/// Provider whose operations never finish.
pub struct RunningProvider;

#[async_trait]
impl GenerationProvider for RunningProvider {
    async fn poll_operation(&self, _operation_ref: &str) -> ReconcileResult<PollOutcome> {
        Ok(PollOutcome::Pending)
    }

    async fn fetch_result_bytes(&self, _location: &str) -> ReconcileResult<Vec<u8>> {
        Ok(Vec::new())
    }
}

pub struct NullArtifacts;

#[async_trait]
impl ArtifactStore for NullArtifacts {
    async fn store(&self, name: &str, _bytes: Vec<u8>, _content_type: &str) -> ReconcileResult<StoreOutcome> {
        Ok(StoreOutcome::Created(name.to_string()))
    }

    async fn public_url(&self, path: &str) -> ReconcileResult<String> {
        Ok(format!("https://videos.test/{}", path))
    }
}

pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn send_completion_notice(&self, _address: &str, _owner_id: &OwnerId) -> ReconcileResult<()> {
        Ok(())
    }
}

pub struct StaticCheck {
    pub name: &'static str,
    pub healthy: bool,
}

#[async_trait]
impl DependencyCheck for StaticCheck {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn check(&self) -> Result<(), String> {
        if self.healthy {
            Ok(())
        } else {
            Err("connection refused".to_string())
        }
    }
}

pub fn reconciler(store: Arc<StubStore>, config: &AppConfig) -> Arc<Reconciler> {
    Arc::new(Reconciler::new(
        store,
        Arc::new(RunningProvider),
        Arc::new(NullArtifacts),
        Arc::new(NullNotifier),
        config.reconciler_config(),
    ))
}

pub fn test_state(store: Arc<StubStore>) -> AppState {
    state_with(store, AppConfig::new(SECRET, "gm-key"))
}

pub fn state_with(store: Arc<StubStore>, config: AppConfig) -> AppState {
    let reconciler = reconciler(store, &config);
    AppState::new(config, reconciler)
}

pub fn router(state: AppState) -> Router {
    create_router(state, None)
}

pub fn pending_job(tag: &str) -> Job {
    let mut job = Job::new_pending(
        "batch-1",
        "user-1",
        format!("https://images.test/{}.png", tag),
        Some(format!("models/veo/operations/{}", tag)),
    );
    job.id = JobId::from(format!("job-{}", tag));
    job
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

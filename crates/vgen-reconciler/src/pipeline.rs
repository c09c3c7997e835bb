//! Completion pipeline for a job whose video is ready.

use std::sync::Arc;
use std::time::Duration;

use vgen_models::{Job, JobUpdate};

use crate::error::{with_timeout, ReconcileResult};
use crate::logging::JobLogger;
use crate::metrics::record_notification;
use crate::ports::{ArtifactStore, GenerationProvider, JobStore, Notifier, StoreOutcome};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Object name for a job's video, namespaced by owner.
///
/// Deterministic so that two passes finishing the same job target the same
/// object.
pub fn artifact_key(job: &Job) -> String {
    format!("{}/{}.mp4", job.owner_id, job.id)
}

/// How a pipeline run ended when no step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// This run moved the job to completed.
    Completed { result_url: String, notified: bool },
    /// The job left the active states before the completion write landed.
    Superseded,
}

/// Download, store, publish and record a finished video.
#[derive(Clone)]
pub struct CompletionPipeline {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn GenerationProvider>,
    artifacts: Arc<dyn ArtifactStore>,
    notifier: Arc<dyn Notifier>,
    call_timeout: Duration,
}

impl CompletionPipeline {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn GenerationProvider>,
        artifacts: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            artifacts,
            notifier,
            call_timeout,
        }
    }

    /// Run the pipeline for `job` with the provider's result at `location`.
    ///
    /// Any error from the download, store, URL or completion write steps is
    /// returned untouched; the caller decides how to fail the job. The
    /// notification step never fails the run.
    pub async fn run(
        &self,
        job: &Job,
        location: &str,
        log: &JobLogger,
    ) -> ReconcileResult<CompletionOutcome> {
        let limit = self.call_timeout;

        let bytes = with_timeout(
            "fetch_result_bytes",
            limit,
            self.provider.fetch_result_bytes(location),
        )
        .await?;
        log.log_progress(&format!("downloaded {} bytes", bytes.len()));

        let key = artifact_key(job);
        let stored = with_timeout(
            "store_artifact",
            limit,
            self.artifacts.store(&key, bytes, VIDEO_CONTENT_TYPE),
        )
        .await?;
        if let StoreOutcome::AlreadyExists(path) = &stored {
            log.log_warning(&format!("artifact {} already stored, reusing it", path));
        }

        let url = with_timeout("public_url", limit, self.artifacts.public_url(stored.path())).await?;

        let applied = with_timeout(
            "update_job_status",
            limit,
            self.store
                .update_job_status(&job.id, JobUpdate::completed(url.clone())),
        )
        .await?;
        if !applied {
            log.log_progress("job finished elsewhere, completion write skipped");
            return Ok(CompletionOutcome::Superseded);
        }

        let notified = self.notify(job, log).await;
        Ok(CompletionOutcome::Completed {
            result_url: url,
            notified,
        })
    }

    /// Best-effort completion notice. Returns whether it was sent.
    async fn notify(&self, job: &Job, log: &JobLogger) -> bool {
        let limit = self.call_timeout;

        let address = match with_timeout(
            "get_owner_contact",
            limit,
            self.store.get_owner_contact(&job.owner_id),
        )
        .await
        {
            Ok(Some(address)) => address,
            Ok(None) => {
                log.log_warning("owner has no contact address, skipping notice");
                record_notification("no_contact");
                return false;
            }
            Err(e) => {
                log.log_error(&format!("contact lookup failed: {}", e));
                record_notification("failed");
                return false;
            }
        };

        if let Err(e) = with_timeout(
            "send_completion_notice",
            limit,
            self.notifier.send_completion_notice(&address, &job.owner_id),
        )
        .await
        {
            log.log_error(&format!("completion notice failed: {}", e));
            record_notification("failed");
            return false;
        }
        record_notification("sent");

        if let Err(e) = with_timeout("mark_notified", limit, self.store.mark_notified(&job.id)).await {
            log.log_error(&format!("notice sent but flag not recorded: {}", e));
        }
        true
    }
}

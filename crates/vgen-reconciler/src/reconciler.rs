//! Reconciliation pass driver.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use futures::future::join_all;
use tracing::{error, info, info_span, Instrument};

use vgen_models::{Job, JobStatus, JobUpdate, PassSummary, PollOutcome};

use crate::config::ReconcilerConfig;
use crate::error::{with_timeout, ReconcileError, ReconcileResult};
use crate::in_flight::{InFlight, InFlightGuard};
use crate::logging::JobLogger;
use crate::metrics::{
    record_completed, record_failed, record_job_error, record_pass, record_poll, record_timed_out,
};
use crate::pipeline::{CompletionOutcome, CompletionPipeline};
use crate::ports::{ArtifactStore, GenerationProvider, JobStore, Notifier};

/// Result of one pass that got past discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Active jobs with an operation handle found by discovery
    pub discovered: usize,
    pub summary: PassSummary,
}

impl PassReport {
    pub fn message(&self) -> &'static str {
        if self.discovered == 0 {
            "No pending items"
        } else {
            "Polling completed"
        }
    }
}

/// What happened to a single polled job.
#[derive(Debug)]
enum JobOutcome {
    /// Provider still working; status is (now) processing.
    Running,
    Completed,
    Failed,
    /// Another actor already finished the job.
    Skipped,
    Error(ReconcileError),
}

/// Drives in-flight jobs towards a terminal state.
pub struct Reconciler {
    store: Arc<dyn JobStore>,
    provider: Arc<dyn GenerationProvider>,
    pipeline: CompletionPipeline,
    config: ReconcilerConfig,
    in_flight: InFlight,
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn JobStore>,
        provider: Arc<dyn GenerationProvider>,
        artifacts: Arc<dyn ArtifactStore>,
        notifier: Arc<dyn Notifier>,
        config: ReconcilerConfig,
    ) -> Self {
        let pipeline = CompletionPipeline::new(
            Arc::clone(&store),
            Arc::clone(&provider),
            artifacts,
            notifier,
            config.remote_call_timeout,
        );

        Self {
            store,
            provider,
            pipeline,
            config,
            in_flight: InFlight::new(),
        }
    }

    /// Jobs currently claimed by a running pass.
    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Run one bounded pass.
    ///
    /// Only discovery failure is returned as an error, in which case no job
    /// was touched. Per-job problems end up in the summary.
    pub async fn run_pass(&self) -> ReconcileResult<PassReport> {
        let started = Instant::now();
        let span = info_span!("reconcile_pass");

        let result = self.run_pass_inner().instrument(span).await;

        let outcome = match &result {
            Ok(report) if report.discovered == 0 => "idle",
            Ok(_) => "ok",
            Err(_) => "discovery_failed",
        };
        record_pass(outcome, started.elapsed());
        result
    }

    async fn run_pass_inner(&self) -> ReconcileResult<PassReport> {
        let limit = self.config.remote_call_timeout;
        let jobs = with_timeout(
            "list_jobs",
            limit,
            self.store
                .list_jobs_by_status_with_operation_ref(&JobStatus::ACTIVE),
        )
        .await
        .map_err(|e| {
            error!("Failed to fetch pending jobs: {}", e);
            e
        })?;

        let mut report = PassReport {
            discovered: jobs.len(),
            summary: PassSummary::default(),
        };
        if jobs.is_empty() {
            return Ok(report);
        }

        let now = Utc::now();
        let threshold = self.config.staleness_threshold();
        let (timed_out, mut active): (Vec<Job>, Vec<Job>) = jobs
            .into_iter()
            .filter(Job::is_reconcilable)
            .partition(|job| job.is_timed_out(now, threshold));

        for job in &timed_out {
            let Some(_claim) = self.in_flight.try_claim(&job.id) else {
                continue;
            };
            match self.expire(job).await {
                Ok(true) => report.summary.timed_out += 1,
                Ok(false) => {}
                Err(e) => {
                    record_job_error(e.kind());
                    report.summary.record_error(&job.id, e);
                }
            }
        }

        active.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        let selected: Vec<(Job, InFlightGuard)> = active
            .into_iter()
            .filter_map(|job| self.in_flight.try_claim(&job.id).map(|claim| (job, claim)))
            .take(self.config.max_concurrent_polls)
            .collect();

        let outcomes = join_all(selected.into_iter().map(|(job, claim)| {
            let log = JobLogger::new(&job, "reconcile");
            let span = log.create_span();
            async move {
                let outcome = self.reconcile_job(&job, &log).await;
                drop(claim);
                (job, outcome)
            }
            .instrument(span)
        }))
        .await;

        for (job, outcome) in outcomes {
            report.summary.checked += 1;
            match outcome {
                JobOutcome::Completed => report.summary.completed += 1,
                JobOutcome::Failed => report.summary.failed += 1,
                JobOutcome::Running | JobOutcome::Skipped => {}
                JobOutcome::Error(e) => {
                    record_job_error(e.kind());
                    report.summary.record_error(&job.id, e);
                }
            }
        }

        info!(
            discovered = report.discovered,
            checked = report.summary.checked,
            completed = report.summary.completed,
            failed = report.summary.failed,
            timed_out = report.summary.timed_out,
            errors = report.summary.errors.len(),
            "Reconciliation pass finished"
        );
        Ok(report)
    }

    /// Fail a stale job without asking the provider. Returns whether this
    /// pass applied the transition.
    async fn expire(&self, job: &Job) -> ReconcileResult<bool> {
        let log = JobLogger::new(job, "timeout");
        let age = job.age(Utc::now());

        if self.already_finished(job).await? {
            return Ok(false);
        }

        let applied = self.write(job, JobUpdate::failed()).await?;
        if applied {
            log.log_warning(&format!("timed out after {} minutes", age.num_minutes()));
            record_timed_out();
        }
        Ok(applied)
    }

    async fn reconcile_job(&self, job: &Job, log: &JobLogger) -> JobOutcome {
        let Some(operation_ref) = job.provider_operation_ref.as_deref() else {
            return JobOutcome::Skipped;
        };

        log.log_start("polling provider");
        let poll = with_timeout(
            "poll_operation",
            self.config.remote_call_timeout,
            self.provider.poll_operation(operation_ref),
        )
        .await;
        if let Ok(outcome) = &poll {
            record_poll(outcome.label());
        }

        match poll {
            Ok(PollOutcome::Pending) => self.mark_processing(job, log).await,
            Ok(PollOutcome::Failed { message }) => {
                log.log_warning(&format!("provider reported failure: {}", message));
                self.fail(job, "provider", log).await
            }
            Ok(PollOutcome::Succeeded { result_location }) => {
                self.complete(job, &result_location, log).await
            }
            Err(e) => {
                log.log_error(&format!("status check failed: {}", e));
                JobOutcome::Error(e)
            }
        }
    }

    async fn mark_processing(&self, job: &Job, log: &JobLogger) -> JobOutcome {
        if job.status == JobStatus::Processing {
            return JobOutcome::Running;
        }
        match self.write(job, JobUpdate::processing()).await {
            Ok(true) => {
                log.log_progress("provider still running, marked processing");
                JobOutcome::Running
            }
            Ok(false) => JobOutcome::Skipped,
            Err(e) => JobOutcome::Error(e),
        }
    }

    async fn fail(&self, job: &Job, reason: &'static str, log: &JobLogger) -> JobOutcome {
        match self.already_finished(job).await {
            Ok(true) => return JobOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return JobOutcome::Error(e),
        }
        self.write_failed(job, reason, log).await
    }

    async fn write_failed(&self, job: &Job, reason: &'static str, log: &JobLogger) -> JobOutcome {
        match self.write(job, JobUpdate::failed()).await {
            Ok(true) => {
                log.log_error(&format!("marked failed ({})", reason));
                record_failed(reason);
                JobOutcome::Failed
            }
            Ok(false) => JobOutcome::Skipped,
            Err(e) => JobOutcome::Error(e),
        }
    }

    async fn complete(&self, job: &Job, location: &str, log: &JobLogger) -> JobOutcome {
        match self.already_finished(job).await {
            Ok(true) => return JobOutcome::Skipped,
            Ok(false) => {}
            Err(e) => return JobOutcome::Error(e),
        }

        log.log_progress("provider finished, storing result");
        match self.pipeline.run(job, location, log).await {
            Ok(CompletionOutcome::Completed { result_url, notified }) => {
                log.log_completion(&format!("{} (notified: {})", result_url, notified));
                record_completed();
                JobOutcome::Completed
            }
            Ok(CompletionOutcome::Superseded) => JobOutcome::Skipped,
            Err(e) => {
                log.log_error(&format!("completion pipeline failed: {}", e));
                self.write_failed(job, "pipeline", log).await
            }
        }
    }

    /// Re-read the stored status; a vanished job counts as finished.
    async fn already_finished(&self, job: &Job) -> ReconcileResult<bool> {
        let status = with_timeout(
            "get_job_status",
            self.config.remote_call_timeout,
            self.store.get_job_status(&job.id),
        )
        .await?;
        Ok(status.map(|s| s.is_terminal()).unwrap_or(true))
    }

    async fn write(&self, job: &Job, update: JobUpdate) -> ReconcileResult<bool> {
        with_timeout(
            "update_job_status",
            self.config.remote_call_timeout,
            self.store.update_job_status(&job.id, update),
        )
        .await
    }
}

//! Reconciler metrics.

use std::time::Duration;

use metrics::{counter, histogram};

pub mod names {
    /// Passes by outcome (`ok`, `idle`, `discovery_failed`).
    pub const PASSES_TOTAL: &str = "vgen_reconcile_passes_total";
    pub const PASS_DURATION_SECONDS: &str = "vgen_reconcile_pass_duration_seconds";
    /// Provider answers by state (`pending`, `failed`, `succeeded`).
    pub const POLLS_TOTAL: &str = "vgen_provider_polls_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "vgen_jobs_completed_total";
    /// Failed transitions by reason (`provider`, `pipeline`).
    pub const JOBS_FAILED_TOTAL: &str = "vgen_jobs_failed_total";
    pub const JOBS_TIMED_OUT_TOTAL: &str = "vgen_jobs_timed_out_total";
    /// Notices by outcome (`sent`, `failed`, `no_contact`).
    pub const NOTIFICATIONS_TOTAL: &str = "vgen_notifications_total";
    /// Per-job errors by kind.
    pub const JOB_ERRORS_TOTAL: &str = "vgen_reconcile_job_errors_total";
}

pub fn record_pass(outcome: &'static str, elapsed: Duration) {
    counter!(names::PASSES_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::PASS_DURATION_SECONDS).record(elapsed.as_secs_f64());
}

pub fn record_poll(state: &'static str) {
    counter!(names::POLLS_TOTAL, "state" => state).increment(1);
}

pub fn record_completed() {
    counter!(names::JOBS_COMPLETED_TOTAL).increment(1);
}

pub fn record_failed(reason: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_timed_out() {
    counter!(names::JOBS_TIMED_OUT_TOTAL).increment(1);
}

pub fn record_notification(outcome: &'static str) {
    counter!(names::NOTIFICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_job_error(kind: &'static str) {
    counter!(names::JOB_ERRORS_TOTAL, "kind" => kind).increment(1);
}

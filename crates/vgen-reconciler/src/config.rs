//! Reconciler configuration.

use std::time::Duration;

/// Tuning for a reconciliation pass.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Active jobs older than this are failed without polling
    pub timeout_threshold: Duration,
    /// Upper bound on jobs polled per pass
    pub max_concurrent_polls: usize,
    /// Limit for every single remote call
    pub remote_call_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            timeout_threshold: Duration::from_secs(10 * 60),
            max_concurrent_polls: 5,
            remote_call_timeout: Duration::from_secs(60),
        }
    }
}

impl ReconcilerConfig {
    pub fn with_timeout_minutes(mut self, minutes: u64) -> Self {
        self.timeout_threshold = Duration::from_secs(minutes * 60);
        self
    }

    pub fn with_max_concurrent_polls(mut self, max: usize) -> Self {
        self.max_concurrent_polls = max;
        self
    }

    pub fn with_remote_call_timeout(mut self, timeout: Duration) -> Self {
        self.remote_call_timeout = timeout;
        self
    }

    /// Threshold as a calendar duration for comparing against job timestamps.
    pub fn staleness_threshold(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.timeout_threshold).unwrap_or(chrono::Duration::MAX)
    }
}

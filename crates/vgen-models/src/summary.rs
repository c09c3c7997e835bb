//! Reconciliation pass summary returned to the trigger caller.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::JobId;

/// Aggregate counters for one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassSummary {
    /// Jobs polled this pass
    pub checked: u32,
    /// Jobs moved to completed this pass
    pub completed: u32,
    /// Jobs moved to failed this pass (timeouts excluded)
    pub failed: u32,
    /// Jobs moved to failed by the staleness threshold
    pub timed_out: u32,
    /// Per-job unexpected errors, `"{job_id}: {message}"`
    pub errors: Vec<String>,
}

impl PassSummary {
    /// Record an unexpected per-job error.
    pub fn record_error(&mut self, job_id: &JobId, message: impl std::fmt::Display) {
        self.errors.push(format!("{}: {}", job_id, message));
    }

    /// Whether the pass touched nothing and hit no errors.
    pub fn is_empty(&self) -> bool {
        *self == PassSummary::default()
    }
}

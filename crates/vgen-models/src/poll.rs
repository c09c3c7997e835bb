//! Provider poll outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What the generation provider reported for an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PollOutcome {
    /// Operation is still running.
    Pending,
    /// Operation finished with an error.
    Failed { message: String },
    /// Operation finished and the result can be fetched from `result_location`.
    Succeeded { result_location: String },
}

impl PollOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            PollOutcome::Pending => "pending",
            PollOutcome::Failed { .. } => "failed",
            PollOutcome::Succeeded { .. } => "succeeded",
        }
    }
}

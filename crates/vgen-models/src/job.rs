//! Generation job records.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::JobStatus;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create from an existing string.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Get the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Unique identifier for a generation job.
    JobId
);

string_id!(
    /// Groups jobs submitted together.
    BatchId
);

string_id!(
    /// Identifies the user who requested the job.
    OwnerId
);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

/// One requested video, as stored by the job store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Batch the job was submitted with
    pub batch_id: BatchId,

    /// Requesting user
    pub owner_id: OwnerId,

    /// Input image reference
    pub source_asset_ref: String,

    /// Provider operation handle, set once the job was submitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_operation_ref: Option<String>,

    /// Current status
    #[serde(default)]
    pub status: JobStatus,

    /// Public URL of the stored result, only for completed jobs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_asset_ref: Option<String>,

    /// Completion notice sent
    #[serde(default)]
    pub notified: bool,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a freshly submitted job.
    pub fn new_pending(
        batch_id: impl Into<BatchId>,
        owner_id: impl Into<OwnerId>,
        source_asset_ref: impl Into<String>,
        provider_operation_ref: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: JobId::new(),
            batch_id: batch_id.into(),
            owner_id: owner_id.into(),
            source_asset_ref: source_asset_ref.into(),
            provider_operation_ref,
            status: JobStatus::Pending,
            result_asset_ref: None,
            notified: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Time elapsed since the job was created.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.created_at
    }

    /// Whether the job has been active longer than `threshold`.
    ///
    /// The comparison is strict: a job exactly at the threshold is still live.
    pub fn is_timed_out(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.age(now) > threshold
    }

    /// Whether a reconciliation pass should consider this job.
    pub fn is_reconcilable(&self) -> bool {
        self.status.is_active() && self.provider_operation_ref.is_some()
    }

    /// Apply an update in memory, mirroring what a store write does.
    pub fn apply(&mut self, update: &JobUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(url) = &update.result_asset_ref {
            self.result_asset_ref = Some(url.clone());
        }
        if let Some(notified) = update.notified {
            self.notified = notified;
        }
        if update.touch {
            self.updated_at = now;
        }
    }
}

/// A partial write to a job record.
///
/// Only the fields that are `Some` (and `updated_at` when `touch` is set) are
/// written, so a store can build a field mask from it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub result_asset_ref: Option<String>,
    pub notified: Option<bool>,
    /// Bump `updated_at` to the write time
    pub touch: bool,
}

impl JobUpdate {
    /// Provider still running. Only the status changes.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            ..Default::default()
        }
    }

    /// Terminal failure.
    pub fn failed() -> Self {
        Self {
            status: Some(JobStatus::Failed),
            touch: true,
            ..Default::default()
        }
    }

    /// Terminal success with the stored artifact's public URL.
    pub fn completed(result_asset_ref: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Completed),
            result_asset_ref: Some(result_asset_ref.into()),
            touch: true,
            ..Default::default()
        }
    }

    /// Completion notice delivered.
    pub fn notified() -> Self {
        Self {
            notified: Some(true),
            ..Default::default()
        }
    }
}

//! Reconciler error types.

use std::time::Duration;

use thiserror::Error;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Job store error: {0}")]
    Firestore(#[from] vgen_firestore::FirestoreError),

    #[error("Artifact store error: {0}")]
    Storage(#[from] vgen_storage::StorageError),

    #[error("Provider error: {0}")]
    Provider(#[from] vgen_provider::ProviderError),

    #[error("Notification error: {0}")]
    Notify(#[from] vgen_notify::NotifyError),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },
}

impl ReconcileError {
    pub fn timeout(operation: &'static str, after: Duration) -> Self {
        Self::Timeout { operation, after }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Firestore(_) => "job_store",
            Self::Storage(_) => "artifact_store",
            Self::Provider(_) => "provider",
            Self::Notify(_) => "notifier",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Bound a remote call by `limit`.
pub async fn with_timeout<T, F>(operation: &'static str, limit: Duration, fut: F) -> ReconcileResult<T>
where
    F: std::future::Future<Output = ReconcileResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ReconcileError::timeout(operation, limit)),
    }
}

//! Generation job reconciler.
//!
//! A pass discovers in-flight jobs, fails the stale ones, polls the provider
//! for a bounded batch of the rest and drives each to its next state. Finished
//! videos go through the completion pipeline: download, create-only store,
//! public URL, conditional completion write, best-effort email.

pub mod adapters;
pub mod config;
pub mod error;
pub mod in_flight;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod ports;
pub mod reconciler;

pub use adapters::FirestoreJobStore;
pub use config::ReconcilerConfig;
pub use error::{ReconcileError, ReconcileResult};
pub use in_flight::{InFlight, InFlightGuard};
pub use logging::JobLogger;
pub use pipeline::{artifact_key, CompletionOutcome, CompletionPipeline, VIDEO_CONTENT_TYPE};
pub use ports::{ArtifactStore, GenerationProvider, JobStore, Notifier, StoreOutcome};
pub use reconciler::{PassReport, Reconciler};

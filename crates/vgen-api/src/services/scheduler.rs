//! Background service running reconciliation passes on an interval.
//!
//! Passes started here and passes started by the cron route may overlap;
//! the reconciler's in-flight registry and conditional writes keep that safe.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use vgen_reconciler::{PassReport, Reconciler};

pub struct ReconcileScheduler {
    reconciler: Arc<Reconciler>,
    period: Duration,
}

impl ReconcileScheduler {
    pub fn new(reconciler: Arc<Reconciler>, period: Duration) -> Self {
        Self { reconciler, period }
    }

    /// Start the loop. Runs until the task is aborted.
    pub async fn run(&self) {
        info!("Starting reconcile scheduler (interval: {:?})", self.period);

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.run_once().await;
        }
    }

    /// Run a single pass, logging instead of returning failures.
    pub async fn run_once(&self) -> Option<PassReport> {
        match self.reconciler.run_pass().await {
            Ok(report) => {
                if !report.summary.is_empty() {
                    info!(
                        checked = report.summary.checked,
                        completed = report.summary.completed,
                        failed = report.summary.failed,
                        timed_out = report.summary.timed_out,
                        "Scheduled pass finished"
                    );
                }
                Some(report)
            }
            Err(e) => {
                error!("Scheduled pass failed: {}", e);
                None
            }
        }
    }
}

//! Jobs currently being reconciled in this process.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use vgen_models::JobId;

/// Shared set of claimed job ids.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    jobs: Arc<Mutex<HashSet<JobId>>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or `None` if another pass already holds it.
    ///
    /// The claim is released when the guard drops.
    pub fn try_claim(&self, id: &JobId) -> Option<InFlightGuard> {
        if !lock(&self.jobs).insert(id.clone()) {
            return None;
        }
        Some(InFlightGuard {
            jobs: Arc::clone(&self.jobs),
            id: id.clone(),
        })
    }

    pub fn contains(&self, id: &JobId) -> bool {
        lock(&self.jobs).contains(id)
    }

    pub fn len(&self) -> usize {
        lock(&self.jobs).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Holds one job's claim.
#[derive(Debug)]
pub struct InFlightGuard {
    jobs: Arc<Mutex<HashSet<JobId>>>,
    id: JobId,
}

impl InFlightGuard {
    pub fn job_id(&self) -> &JobId {
        &self.id
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.jobs).remove(&self.id);
    }
}

// The set stays consistent even if a holder panicked.
fn lock(jobs: &Mutex<HashSet<JobId>>) -> MutexGuard<'_, HashSet<JobId>> {
    jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

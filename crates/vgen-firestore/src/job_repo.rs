//! Repository for generation job documents.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use vgen_models::{BatchId, Job, JobId, JobStatus, JobUpdate, OwnerId};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::record_precondition_conflict;
use crate::types::{Document, FromFirestoreValue, StructuredQuery, ToFirestoreValue, Value};

/// Top-level collection holding one document per job.
pub const JOBS_COLLECTION: &str = "video_items";

/// Read-check-write attempts for a conditional status update.
const MAX_CONDITIONAL_ATTEMPTS: u32 = 5;

/// Repository for job documents.
#[derive(Clone)]
pub struct JobRepository {
    client: FirestoreClient,
}

impl JobRepository {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Active jobs that carry a provider operation handle.
    ///
    /// Documents that fail to decode are logged and skipped.
    pub async fn list_active_with_operation_ref(
        &self,
        statuses: &[JobStatus],
    ) -> FirestoreResult<Vec<Job>> {
        let values: Vec<Value> = statuses.iter().map(|s| s.as_str().to_firestore_value()).collect();
        let query = StructuredQuery::collection(JOBS_COLLECTION).where_in("status", values);

        let docs = self
            .client
            .with_retry("list_active_jobs", || self.client.run_query("", query.clone()))
            .await?;

        let total = docs.len();
        let jobs: Vec<Job> = docs
            .iter()
            .filter_map(|doc| match document_to_job(doc) {
                Ok(job) => Some(job),
                Err(e) => {
                    warn!(doc = ?doc.name, "Skipping undecodable job document: {}", e);
                    None
                }
            })
            .filter(|job| job.provider_operation_ref.is_some())
            .collect();

        debug!(total, selected = jobs.len(), "Listed active jobs");
        Ok(jobs)
    }

    /// Current status of a job, or `None` if the document is gone.
    pub async fn get_status(&self, job_id: &JobId) -> FirestoreResult<Option<JobStatus>> {
        let doc = self
            .client
            .with_retry("get_job_status", || {
                self.client.get_document(JOBS_COLLECTION, job_id.as_str())
            })
            .await?;

        match doc {
            Some(d) => Ok(Some(read_status(&d)?)),
            None => Ok(None),
        }
    }

    /// Apply `update` only while the job is still pending or processing.
    ///
    /// Returns `false` when the job is missing or already terminal. Lost
    /// `updateTime` races re-read the document and try again.
    pub async fn update_if_active(&self, job_id: &JobId, update: &JobUpdate) -> FirestoreResult<bool> {
        for attempt in 0..MAX_CONDITIONAL_ATTEMPTS {
            let doc = self
                .client
                .with_retry("get_job_for_update", || {
                    self.client.get_document(JOBS_COLLECTION, job_id.as_str())
                })
                .await?;

            let Some(doc) = doc else {
                debug!(job_id = %job_id, "Job vanished before conditional update");
                return Ok(false);
            };

            let status = read_status(&doc)?;
            if !status.is_active() {
                debug!(job_id = %job_id, status = %status, "Job no longer active, update skipped");
                return Ok(false);
            }

            let update_time = doc.update_time.clone().ok_or_else(|| {
                FirestoreError::invalid_document(format!("{} has no updateTime", job_id))
            })?;
            let (fields, mask) = update_to_fields(update, Utc::now());

            match self
                .client
                .update_document_with_precondition(
                    JOBS_COLLECTION,
                    job_id.as_str(),
                    fields,
                    mask,
                    &update_time,
                )
                .await
            {
                Ok(_) => {
                    info!(job_id = %job_id, from = %status, to = ?update.status, "Job updated");
                    return Ok(true);
                }
                Err(e) if e.is_precondition_failed() => {
                    record_precondition_conflict(JOBS_COLLECTION);
                    debug!(
                        job_id = %job_id,
                        attempt = attempt + 1,
                        "Job changed concurrently, re-checking"
                    );
                    tokio::time::sleep(Duration::from_millis(50 * (attempt as u64 + 1))).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(FirestoreError::request_failed(format!(
            "Conditional update of {} lost {} races in a row",
            job_id, MAX_CONDITIONAL_ATTEMPTS
        )))
    }

    /// Record that the completion notice went out.
    pub async fn mark_notified(&self, job_id: &JobId) -> FirestoreResult<()> {
        let (fields, mask) = update_to_fields(&JobUpdate::notified(), Utc::now());
        self.client
            .with_retry("mark_notified", || {
                self.client
                    .update_document(JOBS_COLLECTION, job_id.as_str(), fields.clone(), mask.clone())
            })
            .await?;
        Ok(())
    }
}

// =============================================================================
// Conversion
// =============================================================================

fn read_status(doc: &Document) -> FirestoreResult<JobStatus> {
    let raw: String = doc
        .get("status")
        .ok_or_else(|| FirestoreError::invalid_document("missing status"))?;
    raw.parse()
        .map_err(|e: vgen_models::ParseJobStatusError| FirestoreError::invalid_document(e.to_string()))
}

/// Fields and update mask for a partial write.
pub(crate) fn update_to_fields(update: &JobUpdate, now: DateTime<Utc>) -> (HashMap<String, Value>, Vec<String>) {
    let mut fields = HashMap::new();

    if let Some(status) = update.status {
        fields.insert("status".to_string(), status.as_str().to_firestore_value());
    }
    if let Some(url) = &update.result_asset_ref {
        fields.insert("result_video_url".to_string(), url.to_firestore_value());
    }
    if let Some(notified) = update.notified {
        fields.insert("notified".to_string(), notified.to_firestore_value());
    }
    if update.touch {
        fields.insert("updated_at".to_string(), now.to_firestore_value());
    }

    let mut mask: Vec<String> = fields.keys().cloned().collect();
    mask.sort();
    (fields, mask)
}

pub(crate) fn document_to_job(doc: &Document) -> FirestoreResult<Job> {
    let id = doc
        .id()
        .ok_or_else(|| FirestoreError::invalid_document("document has no name"))?;

    let get_string = |key: &str| -> Option<String> { doc.get::<String>(key).filter(|s| !s.is_empty()) };
    let get_time = |key: &str| -> FirestoreResult<DateTime<Utc>> {
        doc.fields
            .as_ref()
            .and_then(|f| f.get(key))
            .and_then(DateTime::<Utc>::from_firestore_value)
            .ok_or_else(|| FirestoreError::invalid_document(format!("{}: missing or invalid {}", id, key)))
    };

    let created_at = get_time("created_at")?;
    let updated_at = get_time("updated_at").unwrap_or(created_at);

    Ok(Job {
        id: JobId::from_string(id),
        batch_id: BatchId::from_string(get_string("batch_id").unwrap_or_default()),
        owner_id: OwnerId::from_string(
            get_string("owner_id")
                .ok_or_else(|| FirestoreError::invalid_document(format!("{}: missing owner_id", id)))?,
        ),
        source_asset_ref: get_string("source_image_url").unwrap_or_default(),
        provider_operation_ref: get_string("provider_operation_ref"),
        status: read_status(doc)?,
        result_asset_ref: get_string("result_video_url"),
        notified: doc.get::<bool>("notified").unwrap_or(false),
        created_at,
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_document(id: &str, status: &str, op_ref: Option<&str>) -> Document {
        let mut fields = HashMap::new();
        fields.insert("batch_id".to_string(), "batch-1".to_firestore_value());
        fields.insert("owner_id".to_string(), "user-1".to_firestore_value());
        fields.insert("source_image_url".to_string(), "https://img/1.png".to_firestore_value());
        fields.insert("status".to_string(), status.to_firestore_value());
        fields.insert(
            "created_at".to_string(),
            Value::TimestampValue("2025-03-01T10:00:00Z".to_string()),
        );
        if let Some(op) = op_ref {
            fields.insert("provider_operation_ref".to_string(), op.to_firestore_value());
        }

        let mut doc = Document::new(fields);
        doc.name = Some(format!(
            "projects/p/databases/(default)/documents/{}/{}",
            JOBS_COLLECTION, id
        ));
        doc
    }

    #[test]
    fn test_document_to_job() {
        let doc = job_document("job-1", "processing", Some("models/veo/operations/abc"));
        let job = document_to_job(&doc).unwrap();

        assert_eq!(job.id.as_str(), "job-1");
        assert_eq!(job.owner_id.as_str(), "user-1");
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.provider_operation_ref.as_deref(), Some("models/veo/operations/abc"));
        assert_eq!(job.updated_at, job.created_at);
        assert!(!job.notified);
        assert!(job.result_asset_ref.is_none());
    }

    #[test]
    fn test_empty_operation_ref_is_absent() {
        let doc = job_document("job-2", "pending", Some(""));
        let job = document_to_job(&doc).unwrap();
        assert!(job.provider_operation_ref.is_none());
        assert!(!job.is_reconcilable());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let doc = job_document("job-3", "queued", None);
        let err = document_to_job(&doc).unwrap_err();
        assert!(matches!(err, FirestoreError::InvalidDocument(_)));
    }

    #[test]
    fn test_processing_update_masks_status_only() {
        let (fields, mask) = update_to_fields(&JobUpdate::processing(), Utc::now());
        assert_eq!(mask, vec!["status".to_string()]);
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_completed_update_fields() {
        let now = Utc::now();
        let (fields, mask) = update_to_fields(&JobUpdate::completed("https://cdn/u/j.mp4"), now);

        assert_eq!(mask, vec!["result_video_url", "status", "updated_at"]);
        assert_eq!(fields["status"], Value::StringValue("completed".into()));
        assert_eq!(fields["updated_at"], Value::TimestampValue(now.to_rfc3339()));
    }
}

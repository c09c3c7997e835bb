//! Job repository writes against a mocked Firestore REST endpoint.

use std::sync::Arc;

use async_trait::async_trait;
use gcp_auth::{Token, TokenProvider};
use serde_json::{json, Value as Json};
use wiremock::matchers::{header, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vgen_models::{JobId, JobUpdate};

use crate::client::{FirestoreClient, FirestoreConfig};
use crate::error::FirestoreError;
use crate::job_repo::JobRepository;

const JOB_PATH: &str = r"/documents/video_items/job-1$";
const UPDATE_TIME: &str = "2025-03-01T10:00:00.000000Z";

struct StaticToken;

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self, _scopes: &[&str]) -> Result<Arc<Token>, gcp_auth::Error> {
        let token: Token =
            serde_json::from_value(json!({"access_token": "test-token", "expires_in": 3600}))
                .unwrap();
        Ok(Arc::new(token))
    }

    async fn project_id(&self) -> Result<Arc<str>, gcp_auth::Error> {
        Ok(Arc::from("test-project"))
    }
}

fn repo_for(server: &MockServer) -> JobRepository {
    let mut config = FirestoreConfig::new("test-project");
    config.api_base_url = server.uri();
    let client = FirestoreClient::with_provider(config, Arc::new(StaticToken)).unwrap();
    JobRepository::new(client)
}

fn job_doc(status: &str) -> Json {
    json!({
        "name": "projects/test-project/databases/(default)/documents/video_items/job-1",
        "fields": {"status": {"stringValue": status}},
        "updateTime": UPDATE_TIME
    })
}

async fn mount_get(server: &MockServer, response: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path_regex(JOB_PATH))
        .respond_with(response)
        .expect(times)
        .mount(server)
        .await;
}

// =============================================================================
// Conditional status writes
// =============================================================================

#[tokio::test]
async fn test_update_if_active_sends_update_time_precondition() {
    let server = MockServer::start().await;
    mount_get(&server, ResponseTemplate::new(200).set_body_json(job_doc("processing")), 1).await;
    Mock::given(method("PATCH"))
        .and(path_regex(JOB_PATH))
        .and(query_param("currentDocument.updateTime", UPDATE_TIME))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_doc("completed")))
        .expect(1)
        .mount(&server)
        .await;

    let applied = repo_for(&server)
        .update_if_active(&JobId::from("job-1"), &JobUpdate::completed("https://cdn/u/job-1.mp4"))
        .await
        .unwrap();

    assert!(applied);
}

#[tokio::test]
async fn test_update_if_active_rereads_after_lost_race() {
    let server = MockServer::start().await;
    mount_get(&server, ResponseTemplate::new(200).set_body_json(job_doc("processing")), 2).await;
    Mock::given(method("PATCH"))
        .and(path_regex(JOB_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": 400,
                "message": "the stored version does not match the required base version",
                "status": "FAILED_PRECONDITION"
            }
        })))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path_regex(JOB_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_doc("failed")))
        .expect(1)
        .mount(&server)
        .await;

    let applied = repo_for(&server)
        .update_if_active(&JobId::from("job-1"), &JobUpdate::failed())
        .await
        .unwrap();

    assert!(applied);
}

#[tokio::test]
async fn test_update_if_active_leaves_terminal_job_alone() {
    let server = MockServer::start().await;
    mount_get(&server, ResponseTemplate::new(200).set_body_json(job_doc("completed")), 1).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let applied = repo_for(&server)
        .update_if_active(&JobId::from("job-1"), &JobUpdate::failed())
        .await
        .unwrap();

    assert!(!applied);
}

#[tokio::test]
async fn test_update_if_active_on_missing_job() {
    let server = MockServer::start().await;
    mount_get(&server, ResponseTemplate::new(404), 1).await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let applied = repo_for(&server)
        .update_if_active(&JobId::from("job-1"), &JobUpdate::processing())
        .await
        .unwrap();

    assert!(!applied);
}

// =============================================================================
// Notification flag
// =============================================================================

#[tokio::test]
async fn test_mark_notified_requires_existing_document() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path_regex(JOB_PATH))
        .and(query_param("currentDocument.exists", "true"))
        .and(query_param("updateMask.fieldPaths", "notified"))
        .respond_with(ResponseTemplate::new(200).set_body_json(job_doc("completed")))
        .expect(1)
        .mount(&server)
        .await;

    repo_for(&server)
        .mark_notified(&JobId::from("job-1"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_mark_notified_on_deleted_job_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path_regex(JOB_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": {"code": 404, "status": "NOT_FOUND"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = repo_for(&server)
        .mark_notified(&JobId::from("job-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, FirestoreError::NotFound(_)));
}

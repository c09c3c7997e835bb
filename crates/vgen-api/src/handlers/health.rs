//! Health check handlers.

use std::collections::BTreeMap;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;

use crate::state::AppState;

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}

/// Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now().to_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: BTreeMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness probe: every configured dependency must answer.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let results = join_all(state.checks.iter().map(|dep| async move {
        let start = Instant::now();
        let status = match dep.check().await {
            Ok(()) => CheckStatus {
                status: "ok",
                error: None,
                latency_ms: Some(start.elapsed().as_millis() as u64),
            },
            Err(e) => CheckStatus {
                status: "error",
                error: Some(e),
                latency_ms: None,
            },
        };
        (dep.name(), status)
    }))
    .await;

    let checks: BTreeMap<_, _> = results.into_iter().collect();
    let all_ok = checks.values().all(CheckStatus::is_ok);
    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" },
        checks,
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

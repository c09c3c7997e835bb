//! Scheduled trigger for a reconciliation pass.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, info, warn};

use vgen_models::PassSummary;

use crate::error::ApiError;
use crate::metrics::record_cron_trigger;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PollResponse {
    pub success: bool,
    pub message: &'static str,
    pub results: PassSummary,
}

#[derive(Debug, Serialize)]
pub struct PollFailure {
    pub success: bool,
    pub error: &'static str,
    pub details: String,
    pub results: PassSummary,
}

/// `GET|POST /api/cron/poll`
///
/// Runs one pass and reports its counters. Callers must send
/// `Authorization: Bearer <CRON_SECRET>`; nothing runs otherwise.
pub async fn poll(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !is_authorized(&headers, &state.config.shared_secret) {
        warn!("Rejected cron trigger without valid credentials");
        record_cron_trigger("unauthorized");
        return ApiError::Unauthorized.into_response();
    }

    match state.reconciler.run_pass().await {
        Ok(report) => {
            info!(
                discovered = report.discovered,
                checked = report.summary.checked,
                "Cron trigger handled"
            );
            record_cron_trigger("ok");
            Json(PollResponse {
                success: true,
                message: report.message(),
                results: report.summary,
            })
            .into_response()
        }
        Err(e) => {
            error!("Cron trigger failed: {}", e);
            record_cron_trigger("failed");
            let details = if state.config.is_production() {
                "An internal error occurred".to_string()
            } else {
                e.to_string()
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(PollFailure {
                    success: false,
                    error: "Failed to fetch pending items",
                    details,
                    results: PassSummary::default(),
                }),
            )
                .into_response()
        }
    }
}

/// Exact match against `Bearer <secret>`.
fn is_authorized(headers: &HeaderMap, secret: &str) -> bool {
    if secret.is_empty() {
        return false;
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token == secret)
        .unwrap_or(false)
}

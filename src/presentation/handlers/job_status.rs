use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error_response::error_response;
use crate::domain::{Job, JobId};
use crate::presentation::state::AppState;

/// A ledger record, or a placeholder for ids the ledger has not seen (yet).
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JobView {
    Known(Job),
    Unknown { id: String, status: &'static str },
}

impl JobView {
    fn unknown(id: &str) -> Self {
        JobView::Unknown {
            id: id.to_string(),
            status: "unknown",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchQuery {
    pub ids: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn job_status_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Response {
    let id = match job_id.parse::<JobId>() {
        Ok(id) => id,
        Err(_) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid job ID: {}", job_id),
            );
        }
    };

    match state.job_ledger.get(id).await {
        Ok(Some(job)) => (StatusCode::OK, Json(job)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", job_id)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch job status");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to fetch job: {}", e),
            )
        }
    }
}

/// One entry per requested id, in request order. Ids that are malformed,
/// unknown or unreadable come back as `unknown` instead of failing the batch.
#[tracing::instrument(skip(state))]
pub async fn jobs_batch_handler(
    State(state): State<AppState>,
    Query(query): Query<BatchQuery>,
) -> Response {
    let ids: Vec<&str> = query
        .ids
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();

    if ids.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "ids query is required");
    }

    let mut views = Vec::with_capacity(ids.len());
    for raw in ids {
        let view = match raw.parse::<JobId>() {
            Ok(id) => match state.job_ledger.get(id).await {
                Ok(Some(job)) => JobView::Known(job),
                Ok(None) => JobView::unknown(raw),
                Err(e) => {
                    tracing::warn!(error = %e, job_id = %raw, "Failed to read job in batch");
                    JobView::unknown(raw)
                }
            },
            Err(_) => JobView::unknown(raw),
        };
        views.push(view);
    }

    (StatusCode::OK, Json(views)).into_response()
}

#[tracing::instrument(skip(state))]
pub async fn recent_jobs_handler(State(state): State<AppState>) -> Response {
    match state.job_ledger.recent(state.recent_limit).await {
        Ok(jobs) => (StatusCode::OK, Json(jobs)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to list recent jobs");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to list jobs: {}", e),
            )
        }
    }
}

use std::io;

use axum::Json;
use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};

use super::error_response::error_response;
use crate::application::services::{StagedUpload, UploadError};
use crate::domain::{VaultPath, sanitize_file_name};
use crate::presentation::state::AppState;

const FILE_FIELD: &str = "file";
const DIR_FIELD: &str = "dir";

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub dir: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub accepted: bool,
    pub job_id: String,
    pub file: String,
}

/// Stages the file field to disk as it arrives, then enqueues the relocation.
/// Answers as soon as the broker has the task; the move happens later.
#[tracing::instrument(skip(state, query, multipart))]
pub async fn upload_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Response {
    let mut staged: Option<StagedUpload> = None;
    let mut dir_field: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read multipart");
                return reject(&state, staged, format!("Failed to read multipart: {}", e)).await;
            }
        };

        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some(FILE_FIELD) if staged.is_none() => {
                let Some(file_name) = field.file_name().and_then(sanitize_file_name) else {
                    return reject(&state, staged, "Uploaded file has no name").await;
                };
                let stream = field
                    .map_err(|e| io::Error::other(e.to_string()))
                    .boxed();

                match state.upload_service.stage(&file_name, stream).await {
                    Ok(upload) => staged = Some(upload),
                    Err(e) => {
                        tracing::error!(error = %e, file = %file_name, "Failed to stage upload");
                        return error_response(
                            StatusCode::INTERNAL_SERVER_ERROR,
                            "Upload failed",
                        );
                    }
                }
            }
            Some(FILE_FIELD) => {
                return reject(&state, staged, "Only one file per upload").await;
            }
            Some(DIR_FIELD) => match field.text().await {
                Ok(text) => dir_field = Some(text),
                Err(e) => {
                    return reject(&state, staged, format!("Failed to read dir: {}", e)).await;
                }
            },
            _ => {}
        }
    }

    let Some(staged) = staged else {
        tracing::warn!("Upload request with no file");
        return error_response(StatusCode::BAD_REQUEST, "No file uploaded");
    };

    let raw_dir = dir_field.or(query.dir).unwrap_or_default();
    let target_dir = match VaultPath::parse(&raw_dir) {
        Ok(dir) => dir,
        Err(e) => return reject(&state, Some(staged), e.to_string()).await,
    };

    match state.upload_service.enqueue(staged, &target_dir).await {
        Ok(accepted) => (
            StatusCode::ACCEPTED,
            Json(UploadResponse {
                accepted: true,
                job_id: accepted.job_id.to_string(),
                file: accepted.file_name,
            }),
        )
            .into_response(),
        Err(UploadError::Enqueue(_)) => error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Upload queue unavailable, upload not accepted",
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to accept upload");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed")
        }
    }
}

/// 400 for a malformed request, dropping anything already staged.
async fn reject(
    state: &AppState,
    staged: Option<StagedUpload>,
    error: impl Into<String>,
) -> Response {
    if let Some(staged) = staged {
        state.upload_service.discard(&staged).await;
    }
    error_response(StatusCode::BAD_REQUEST, error)
}

use axum::extract::{Query, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use super::error_response::error_response;
use crate::application::services::ThumbnailError;
use crate::domain::VaultPath;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ThumbnailQuery {
    pub path: Option<String>,
}

#[tracing::instrument(skip(state))]
pub async fn thumbnail_handler(
    State(state): State<AppState>,
    Query(query): Query<ThumbnailQuery>,
) -> Response {
    let Some(raw) = query.path.filter(|p| !p.trim().is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Path query is required");
    };

    let source = match VaultPath::parse(&raw) {
        Ok(source) => source,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, e.to_string()),
    };

    match state.thumbnail_cache.thumbnail(&source).await {
        Ok(bytes) => ([(header::CONTENT_TYPE, "image/png")], bytes).into_response(),
        Err(ThumbnailError::NotAnImage) => {
            error_response(StatusCode::BAD_REQUEST, "Not an image file")
        }
        Err(ThumbnailError::SourceNotFound) => {
            error_response(StatusCode::NOT_FOUND, "File not found")
        }
        Err(e) => {
            tracing::error!(error = %e, "Thumbnail generation failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Thumbnail generation failed",
            )
        }
    }
}

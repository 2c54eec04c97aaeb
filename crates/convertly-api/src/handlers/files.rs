//! Signed file download handler.

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use chrono::Utc;
use serde::Deserialize;

use convertly_core::error::AppError;

use crate::error::ApiError;
use crate::state::AppState;

/// Query parameters carried by a signed download URL.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Unix timestamp after which the URL is no longer valid.
    pub expires: i64,
    /// Opaque URL token.
    #[allow(dead_code)]
    pub token: String,
}

/// GET /api/files/{*key}
///
/// Serves the object a signed URL points at. The expiry window is
/// enforced here; the token is opaque and single-node.
pub async fn download(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.expires < Utc::now().timestamp() {
        return Err(AppError::validation("download URL has expired").into());
    }

    let data = state.object_store.download(&key).await?;
    let filename = key.rsplit('/').next().unwrap_or("download").to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    ))
}

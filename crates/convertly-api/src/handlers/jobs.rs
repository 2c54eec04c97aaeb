//! Job submission and status handlers.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use tracing::warn;

use convertly_core::error::AppError;
use convertly_core::types::JobId;
use convertly_entity::{DocumentPayload, ImagePayload, JobPayload, JobStatus};

use crate::dto::{ApiResponse, JobStatusResponse, SubmitResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// POST /api/jobs/document
///
/// Accepts a document-family payload, returns `202 Accepted` with the
/// job id before any transformation work starts.
pub async fn submit_document(
    State(state): State<AppState>,
    Json(payload): Json<DocumentPayload>,
) -> Result<(StatusCode, Json<ApiResponse<SubmitResponse>>), ApiError> {
    let receipt = state
        .dispatcher
        .submit(JobPayload::Document(payload))
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(receipt.into())),
    ))
}

/// POST /api/jobs/image
pub async fn submit_image(
    State(state): State<AppState>,
    Json(payload): Json<ImagePayload>,
) -> Result<(StatusCode, Json<ApiResponse<SubmitResponse>>), ApiError> {
    let receipt = state.dispatcher.submit(JobPayload::Image(payload)).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok(receipt.into())),
    ))
}

/// GET /api/jobs/{id}
///
/// The polling endpoint. For a completed job this mints a fresh signed
/// download URL on every read; if signing fails the job is still
/// reported as completed, with `download_url: null`.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<ApiResponse<JobStatusResponse>>, ApiError> {
    let job = state
        .job_store
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("job {id} not found")))?;

    let output = job.typed_result()?;
    let download_url = match (&output, job.status) {
        (Some(output), JobStatus::Completed) => {
            let ttl = Duration::from_secs(state.config.storage.url_ttl_seconds);
            match state.object_store.sign_download_url(&output.key, ttl).await {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(job_id = %id, error = %e, "Failed to sign download URL");
                    None
                }
            }
        }
        _ => None,
    };

    Ok(Json(ApiResponse::ok(JobStatusResponse::from_job(
        &job,
        output,
        download_url,
    ))))
}

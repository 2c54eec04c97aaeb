//! Request and response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use convertly_core::types::JobId;
use convertly_entity::{Job, JobOutput, JobStatus, SubmitReceipt};

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Body returned for an accepted job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// The new job's identifier, used for polling.
    pub job_id: JobId,
    /// Initial status, always `queued`.
    pub status: JobStatus,
}

impl From<SubmitReceipt> for SubmitResponse {
    fn from(receipt: SubmitReceipt) -> Self {
        Self {
            job_id: receipt.job_id,
            status: receipt.status,
        }
    }
}

/// The polled view of a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    /// Job identifier.
    pub job_id: JobId,
    /// Job family.
    pub family: String,
    /// Operation name within the family.
    pub task: String,
    /// Current status.
    pub status: JobStatus,
    /// Result data, present only once the job is completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResultView>,
    /// Error message, present only when the job has failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Result projection with an on-demand signed download URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResultView {
    /// Object key of the produced file.
    pub key: String,
    /// Size of the produced file in bytes.
    pub size: u64,
    /// Pixel width, for image outputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Pixel height, for image outputs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Time-limited download URL, minted per status request. `null`
    /// when the URL could not be signed; the job itself is still
    /// reported as completed.
    pub download_url: Option<String>,
}

impl JobStatusResponse {
    /// Project a job record, attaching a freshly signed URL if given.
    pub fn from_job(job: &Job, output: Option<JobOutput>, download_url: Option<String>) -> Self {
        Self {
            job_id: job.id,
            family: job.family.to_string(),
            task: job.task.clone(),
            status: job.status,
            result: output.map(|o| JobResultView {
                key: o.key,
                size: o.size,
                width: o.width,
                height: o.height,
                download_url,
            }),
            error: job.error_message.clone(),
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Build version.
    pub version: String,
}

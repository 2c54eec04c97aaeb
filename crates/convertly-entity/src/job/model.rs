//! Job record model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use convertly_core::result::AppResult;
use convertly_core::types::JobId;

use super::family::JobFamily;
use super::payload::JobPayload;
use super::status::JobStatus;

/// A conversion job record — the single source of truth for polling.
///
/// Created once by the dispatcher with `status = queued`, then mutated
/// only through forward status transitions. `result` is populated only
/// on completion and `error_message` only on failure; never both.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    /// Unique job identifier, the external polling handle.
    pub id: JobId,
    /// Family selecting the worker pool.
    pub family: JobFamily,
    /// Operation name within the family.
    pub task: String,
    /// Task-specific input (JSON form of [`JobPayload`]).
    pub payload: serde_json::Value,
    /// Current job status.
    pub status: JobStatus,
    /// Result data on completion (JSON form of [`JobOutput`]).
    pub result: Option<serde_json::Value>,
    /// Error message on failure.
    pub error_message: Option<String>,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When the job was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Build a fresh queued job from a validated payload.
    pub fn from_payload(payload: &JobPayload) -> AppResult<Self> {
        let now = Utc::now();
        Ok(Self {
            id: JobId::new(),
            family: payload.family(),
            task: payload.task().to_string(),
            payload: serde_json::to_value(payload)?,
            status: JobStatus::Queued,
            result: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Decode the typed payload back out of the stored JSON.
    pub fn typed_payload(&self) -> AppResult<JobPayload> {
        let payload = match self.family {
            JobFamily::Document => JobPayload::Document(serde_json::from_value(
                self.payload.clone(),
            )?),
            JobFamily::Image => {
                JobPayload::Image(serde_json::from_value(self.payload.clone())?)
            }
        };
        Ok(payload)
    }

    /// Decode the typed output, if the job has completed.
    pub fn typed_result(&self) -> AppResult<Option<JobOutput>> {
        match &self.result {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }
}

/// Output of a successful transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOutput {
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
}

impl JobOutput {
    /// Output of a document transformation (no dimensions).
    pub fn document(key: impl Into<String>, size: u64) -> Self {
        Self {
            key: key.into(),
            size,
            width: None,
            height: None,
        }
    }

    /// Output of an image transformation.
    pub fn image(key: impl Into<String>, size: u64, width: u32, height: u32) -> Self {
        Self {
            key: key.into(),
            size,
            width: Some(width),
            height: Some(height),
        }
    }
}

/// The synchronous response to a submission: the job handle and its
/// initial status. All transformation work happens after this is
/// returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// The new job's identifier.
    pub job_id: JobId,
    /// Always [`JobStatus::Queued`] at submission time.
    pub status: JobStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::payload::{DocumentPayload, ImagePayload};

    #[test]
    fn test_from_payload_starts_queued() {
        let payload = JobPayload::Image(ImagePayload::Resize {
            key: "in.png".into(),
            scale_percent: 50,
        });
        let job = Job::from_payload(&payload).expect("build job");
        assert_eq!(job.status, JobStatus::Queued);
        assert_eq!(job.family, JobFamily::Image);
        assert_eq!(job.task, "resize");
        assert!(job.result.is_none());
        assert!(job.error_message.is_none());
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = JobPayload::Document(DocumentPayload::Split {
            key: "doc.pdf".into(),
            start_page: 2,
            end_page: 4,
        });
        let job = Job::from_payload(&payload).expect("build job");
        match job.typed_payload().expect("decode") {
            JobPayload::Document(DocumentPayload::Split {
                key,
                start_page,
                end_page,
            }) => {
                assert_eq!(key, "doc.pdf");
                assert_eq!((start_page, end_page), (2, 4));
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn test_output_serialization_skips_missing_dimensions() {
        let output = JobOutput::document("outputs/x/merged.pdf", 1234);
        let json = serde_json::to_value(&output).expect("serialize");
        assert!(json.get("width").is_none());
        assert!(json.get("height").is_none());
    }
}

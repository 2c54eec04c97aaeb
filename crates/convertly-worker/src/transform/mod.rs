//! Transformation functions.
//!
//! One [`Transformer`] per family; the worker pool hands it the full
//! job and it selects the operation by task. Transformers are thin
//! wrappers over the PDF/image libraries and the office converter
//! subprocess; they stage all input and output through the object
//! store and share no mutable state across jobs.

pub mod document;
pub mod image;

use async_trait::async_trait;

use convertly_core::result::AppResult;
use convertly_core::types::JobId;
use convertly_entity::{Job, JobOutput};

pub use document::DocumentTransformer;
pub use image::ImageTransformer;

/// A family's transformation entry point.
#[async_trait]
pub trait Transformer: Send + Sync + std::fmt::Debug + 'static {
    /// Run the job's operation and produce its output.
    async fn apply(&self, job: &Job) -> AppResult<JobOutput>;
}

/// Build the output object key for a job.
///
/// Output keys live under a per-job prefix, so they are always distinct
/// from any input key.
pub(crate) fn output_key(job_id: JobId, name: &str, ext: &str) -> String {
    format!("outputs/{job_id}/{name}.{ext}")
}

/// File extension of an object key, if it has one.
pub(crate) fn key_extension(key: &str) -> Option<&str> {
    let name = key.rsplit('/').next()?;
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_key_is_distinct_from_inputs() {
        let id = JobId::new();
        let key = output_key(id, "merged", "pdf");
        assert_eq!(key, format!("outputs/{id}/merged.pdf"));
    }

    #[test]
    fn test_key_extension() {
        assert_eq!(key_extension("inputs/report.docx"), Some("docx"));
        assert_eq!(key_extension("inputs/noext"), None);
        assert_eq!(key_extension("inputs/.hidden"), None);
    }
}

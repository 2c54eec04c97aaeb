//! The job record store contract.
//!
//! The dispatcher is the sole writer; the status endpoint is a
//! read-only consumer. Implementations must keep updates scoped to
//! their own job id so concurrent in-flight jobs never corrupt
//! unrelated records.

pub mod memory;
pub mod pg;

use async_trait::async_trait;

use convertly_core::result::AppResult;
use convertly_core::types::JobId;
use convertly_entity::{Job, JobOutput};

/// Durable key-value contract for job records, keyed by job id.
///
/// Status writes are forward-only: a terminal record is never
/// overwritten. Terminal writes are accepted from any live state so
/// that a lost `processing` write cannot strand a finished job in
/// `queued`. The `mark_*` methods are also tolerant of a record that
/// is not (yet) visible: the update is logged and dropped rather than
/// escalated, because the terminal write on the same execution path
/// will still land once the insert is visible.
#[async_trait]
pub trait JobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Insert a new record. Must succeed before the job id is returned
    /// to the submitter.
    async fn create(&self, job: &Job) -> AppResult<()>;

    /// Transition a queued record to processing.
    async fn mark_processing(&self, id: JobId) -> AppResult<()>;

    /// Transition a live record to completed with its result.
    async fn mark_completed(&self, id: JobId, output: &JobOutput) -> AppResult<()>;

    /// Transition a live record to failed with an error message.
    async fn mark_failed(&self, id: JobId, error: &str) -> AppResult<()>;

    /// Look up a record by id.
    async fn get(&self, id: JobId) -> AppResult<Option<Job>>;
}

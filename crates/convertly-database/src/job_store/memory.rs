//! In-memory job store for tests and single-process development.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use tracing::warn;

use convertly_core::result::AppResult;
use convertly_core::types::JobId;
use convertly_entity::{Job, JobOutput, JobStatus};

use super::JobStore;

/// Job store over a concurrent in-process map.
///
/// Enforces the same forward-only rules as the SQL guards in the
/// PostgreSQL store: a terminal record is never overwritten, terminal
/// writes are accepted from any live state, and a dropped update (for
/// an illegal transition or a record that does not exist) is logged,
/// never an error.
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: DashMap<JobId, Job>,
}

impl MemoryJobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    fn transition(
        &self,
        id: JobId,
        next: JobStatus,
        apply: impl FnOnce(&mut Job),
    ) {
        match self.jobs.get_mut(&id) {
            Some(mut entry) => {
                // Same tolerance as the SQL guards: a terminal write
                // lands from queued too, in case the processing write
                // was lost.
                let permitted = entry.status.can_transition_to(next)
                    || (next.is_terminal() && !entry.status.is_terminal());
                if permitted {
                    apply(&mut entry);
                    entry.status = next;
                    entry.updated_at = Utc::now();
                } else {
                    warn!(
                        job_id = %id,
                        from = %entry.status,
                        to = %next,
                        "Illegal job status transition; dropping patch"
                    );
                }
            }
            None => {
                warn!(job_id = %id, to = %next, "Job status update matched no record; dropping patch");
            }
        }
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn create(&self, job: &Job) -> AppResult<()> {
        self.jobs.insert(job.id, job.clone());
        Ok(())
    }

    async fn mark_processing(&self, id: JobId) -> AppResult<()> {
        self.transition(id, JobStatus::Processing, |_| {});
        Ok(())
    }

    async fn mark_completed(&self, id: JobId, output: &JobOutput) -> AppResult<()> {
        let result = serde_json::to_value(output)?;
        self.transition(id, JobStatus::Completed, |job| {
            job.result = Some(result);
        });
        Ok(())
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> AppResult<()> {
        self.transition(id, JobStatus::Failed, |job| {
            job.error_message = Some(error.to_string());
        });
        Ok(())
    }

    async fn get(&self, id: JobId) -> AppResult<Option<Job>> {
        Ok(self.jobs.get(&id).map(|entry| entry.clone()))
    }
}

//! PostgreSQL job store implementation.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::warn;

use convertly_core::error::{AppError, ErrorKind};
use convertly_core::result::AppResult;
use convertly_core::types::JobId;
use convertly_entity::{Job, JobOutput};

use super::JobStore;

/// Job store backed by a PostgreSQL `jobs` table.
///
/// Forward-only transitions are enforced in SQL: every status UPDATE is
/// guarded on the current status, so a terminal record can never be
/// overwritten and a re-delivered write is a no-op. Terminal writes are
/// accepted from any live state, not just `processing`; a job whose
/// `processing` write was lost to a transient store error must still
/// land its outcome.
#[derive(Debug, Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Create a new job store over an existing connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Mark jobs stuck in `processing` longer than `older_than` as failed.
    ///
    /// Not wired to any scheduler; intended for manual operator use
    /// after a crash leaves jobs without a live execution task.
    pub async fn sweep_stale(&self, older_than: Duration) -> AppResult<u64> {
        let cutoff = Utc::now() - older_than;
        let result = sqlx::query(
            "UPDATE jobs SET status = 'failed', \
             error_message = 'abandoned: no worker completed this job', \
             updated_at = NOW() \
             WHERE status = 'processing' AND updated_at < $1",
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to sweep stale jobs", e)
        })?;
        Ok(result.rows_affected())
    }

    /// Log and swallow an update that matched no row.
    fn dropped(id: JobId, target: &str, rows: u64) {
        if rows == 0 {
            warn!(
                job_id = %id,
                target,
                "Job status update matched no row; dropping patch"
            );
        }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn create(&self, job: &Job) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO jobs (id, family, task, payload, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(job.id)
        .bind(job.family)
        .bind(&job.task)
        .bind(&job.payload)
        .bind(job.status)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create job", e))?;
        Ok(())
    }

    async fn mark_processing(&self, id: JobId) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'processing', updated_at = NOW() \
             WHERE id = $1 AND status = 'queued'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job processing", e)
        })?;
        Self::dropped(id, "processing", result.rows_affected());
        Ok(())
    }

    async fn mark_completed(&self, id: JobId, output: &JobOutput) -> AppResult<()> {
        let result_json = serde_json::to_value(output)?;
        let result = sqlx::query(
            "UPDATE jobs SET status = 'completed', result = $2, updated_at = NOW() \
             WHERE id = $1 AND status IN ('queued', 'processing')",
        )
        .bind(id)
        .bind(result_json)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job completed", e)
        })?;
        Self::dropped(id, "completed", result.rows_affected());
        Ok(())
    }

    async fn mark_failed(&self, id: JobId, error: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'failed', error_message = $2, updated_at = NOW() \
             WHERE id = $1 AND status IN ('queued', 'processing')",
        )
        .bind(id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to mark job failed", e)
        })?;
        Self::dropped(id, "failed", result.rows_affected());
        Ok(())
    }

    async fn get(&self, id: JobId) -> AppResult<Option<Job>> {
        sqlx::query_as::<_, Job>("SELECT * FROM jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find job", e))
    }
}

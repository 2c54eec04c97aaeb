//! Job dispatcher: the single entry point for submitting work.
//!
//! Submission is a synchronous validate-and-record step; everything
//! else happens in a spawned background task that owns the record's
//! remaining lifecycle. That task is the only writer of the job's
//! status after creation, so there is exactly one place where a job
//! can end up completed or failed.

use std::sync::Arc;

use tracing::{error, info, warn};

use convertly_core::error::AppError;
use convertly_core::result::AppResult;
use convertly_database::JobStore;
use convertly_entity::{Job, JobFamily, JobPayload, JobStatus, SubmitReceipt};

use crate::pool::WorkerPool;

/// Routes validated submissions into per-family worker pools and keeps
/// the job record in step with execution.
#[derive(Debug, Clone)]
pub struct JobDispatcher {
    store: Arc<dyn JobStore>,
    document_pool: Arc<WorkerPool>,
    image_pool: Arc<WorkerPool>,
}

impl JobDispatcher {
    pub fn new(
        store: Arc<dyn JobStore>,
        document_pool: Arc<WorkerPool>,
        image_pool: Arc<WorkerPool>,
    ) -> Self {
        Self {
            store,
            document_pool,
            image_pool,
        }
    }

    /// Submit a job for asynchronous execution.
    ///
    /// Validates the payload, persists a queued record, then hands off
    /// to the background executor and returns immediately. A validation
    /// or persistence error is returned synchronously and leaves no
    /// record behind; once this returns `Ok`, the job's outcome is
    /// reported exclusively through the record.
    pub async fn submit(&self, payload: JobPayload) -> AppResult<SubmitReceipt> {
        payload.validate()?;

        let job = Job::from_payload(&payload)?;
        self.store.create(&job).await?;

        info!(
            job_id = %job.id,
            family = %job.family,
            task = %job.task,
            "Job accepted"
        );

        let dispatcher = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            dispatcher.execute(job).await;
        });

        Ok(SubmitReceipt {
            job_id,
            status: JobStatus::Queued,
        })
    }

    /// Look up a job record.
    pub async fn get(&self, id: convertly_core::types::JobId) -> AppResult<Option<Job>> {
        self.store.get(id).await
    }

    /// Drive one job to a terminal state.
    ///
    /// Never returns an error: every outcome, including pool saturation
    /// and store write failures, is absorbed here so the spawned task
    /// cannot leak a panic or an unhandled result.
    async fn execute(&self, job: Job) {
        let job_id = job.id;

        if let Err(e) = self.store.mark_processing(job_id).await {
            // Keep going: the terminal write below is the one that matters.
            warn!(job_id = %job_id, error = %e, "Failed to mark job processing");
        }

        let pool = self.pool_for(job.family);
        let result = pool.run(job).await;

        match result {
            Ok(output) => {
                if let Err(e) = self.store.mark_completed(job_id, &output).await {
                    error!(job_id = %job_id, error = %e, "Failed to record job completion");
                } else {
                    info!(job_id = %job_id, output_key = %output.key, "Job completed");
                }
            }
            Err(e) => {
                self.record_failure(job_id, &e).await;
            }
        }
    }

    async fn record_failure(&self, id: convertly_core::types::JobId, cause: &AppError) {
        warn!(job_id = %id, error = %cause, "Job failed");
        if let Err(e) = self.store.mark_failed(id, &cause.message).await {
            error!(job_id = %id, error = %e, "Failed to record job failure");
        }
    }

    fn pool_for(&self, family: JobFamily) -> &WorkerPool {
        match family {
            JobFamily::Document => &self.document_pool,
            JobFamily::Image => &self.image_pool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use async_trait::async_trait;
    use convertly_core::config::worker::PoolConfig;
    use convertly_core::error::ErrorKind;
    use convertly_database::MemoryJobStore;
    use convertly_entity::{DocumentPayload, ImagePayload, JobOutput};

    use crate::transform::Transformer;

    #[derive(Debug)]
    struct Succeeding;

    #[async_trait]
    impl Transformer for Succeeding {
        async fn apply(&self, job: &Job) -> AppResult<JobOutput> {
            Ok(JobOutput::document(format!("outputs/{}/done.pdf", job.id), 42))
        }
    }

    #[derive(Debug)]
    struct Failing;

    #[async_trait]
    impl Transformer for Failing {
        async fn apply(&self, _job: &Job) -> AppResult<JobOutput> {
            Err(AppError::transformation("source file is corrupt"))
        }
    }

    /// Store whose `mark_processing` fails once before recovering.
    #[derive(Debug)]
    struct FlakyProcessingStore {
        inner: MemoryJobStore,
        failed_once: std::sync::atomic::AtomicBool,
    }

    impl FlakyProcessingStore {
        fn new() -> Self {
            Self {
                inner: MemoryJobStore::new(),
                failed_once: std::sync::atomic::AtomicBool::new(false),
            }
        }
    }

    #[async_trait]
    impl JobStore for FlakyProcessingStore {
        async fn create(&self, job: &Job) -> AppResult<()> {
            self.inner.create(job).await
        }

        async fn mark_processing(&self, id: convertly_core::types::JobId) -> AppResult<()> {
            if !self.failed_once.swap(true, std::sync::atomic::Ordering::SeqCst) {
                return Err(AppError::database("connection reset"));
            }
            self.inner.mark_processing(id).await
        }

        async fn mark_completed(
            &self,
            id: convertly_core::types::JobId,
            output: &JobOutput,
        ) -> AppResult<()> {
            self.inner.mark_completed(id, output).await
        }

        async fn mark_failed(&self, id: convertly_core::types::JobId, error: &str) -> AppResult<()> {
            self.inner.mark_failed(id, error).await
        }

        async fn get(&self, id: convertly_core::types::JobId) -> AppResult<Option<Job>> {
            self.inner.get(id).await
        }
    }

    fn dispatcher(transformer: Arc<dyn Transformer>) -> JobDispatcher {
        dispatcher_with(Arc::new(MemoryJobStore::new()), transformer)
    }

    fn dispatcher_with(store: Arc<dyn JobStore>, transformer: Arc<dyn Transformer>) -> JobDispatcher {
        let config = PoolConfig {
            workers: 2,
            backlog: 10,
            dispatch_timeout_ms: 1000,
        };
        let document_pool = Arc::new(WorkerPool::new(
            JobFamily::Document,
            &config,
            transformer.clone(),
        ));
        let image_pool = Arc::new(WorkerPool::new(JobFamily::Image, &config, transformer));
        JobDispatcher::new(store, document_pool, image_pool)
    }

    async fn wait_terminal(dispatcher: &JobDispatcher, id: convertly_core::types::JobId) -> Job {
        for _ in 0..100 {
            let job = dispatcher
                .get(id)
                .await
                .expect("store read")
                .expect("record exists");
            if job.status.is_terminal() {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never reached a terminal state");
    }

    #[tokio::test]
    async fn test_submit_returns_queued_receipt_immediately() {
        let d = dispatcher(Arc::new(Succeeding));
        let receipt = d
            .submit(JobPayload::Image(ImagePayload::Resize {
                key: "in.png".into(),
                scale_percent: 50,
            }))
            .await
            .unwrap();

        assert_eq!(receipt.status, JobStatus::Queued);
        // Record is queryable as soon as the receipt is in hand.
        assert!(d.get(receipt.job_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_successful_job_reaches_completed_with_result() {
        let d = dispatcher(Arc::new(Succeeding));
        let receipt = d
            .submit(JobPayload::Document(DocumentPayload::Merge {
                keys: vec!["a.pdf".into(), "b.pdf".into()],
            }))
            .await
            .unwrap();

        let job = wait_terminal(&d, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        let output = job.typed_result().unwrap().expect("result present");
        assert_eq!(output.size, 42);
        assert!(job.error_message.is_none());
    }

    #[tokio::test]
    async fn test_failed_job_records_error_message() {
        let d = dispatcher(Arc::new(Failing));
        let receipt = d
            .submit(JobPayload::Image(ImagePayload::Compress {
                key: "in.jpg".into(),
                quality: 80,
            }))
            .await
            .unwrap();

        let job = wait_terminal(&d, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("source file is corrupt"));
        assert!(job.result.is_none());
    }

    #[tokio::test]
    async fn test_completion_lands_despite_lost_processing_write() {
        let d = dispatcher_with(Arc::new(FlakyProcessingStore::new()), Arc::new(Succeeding));
        let receipt = d
            .submit(JobPayload::Image(ImagePayload::Resize {
                key: "in.png".into(),
                scale_percent: 50,
            }))
            .await
            .unwrap();

        let job = wait_terminal(&d, receipt.job_id).await;
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.typed_result().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalid_payload_is_rejected_without_a_record() {
        let d = dispatcher(Arc::new(Succeeding));
        let err = d
            .submit(JobPayload::Document(DocumentPayload::Merge {
                keys: vec!["only-one.pdf".into()],
            }))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_quality_out_of_range_is_rejected() {
        let d = dispatcher(Arc::new(Succeeding));
        let err = d
            .submit(JobPayload::Image(ImagePayload::Compress {
                key: "in.jpg".into(),
                quality: 0,
            }))
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
    }
}

//! Bounded worker pool for one job family.
//!
//! A fixed set of long-lived tokio tasks reads from a bounded work
//! channel. Each task processes one job at a time; the channel depth is
//! the pool's backlog. Submissions beyond the backlog are rejected with
//! a saturation error after a bounded wait, providing backpressure
//! instead of unbounded queue growth.

use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use convertly_core::config::worker::PoolConfig;
use convertly_core::error::AppError;
use convertly_core::result::AppResult;
use convertly_entity::{Job, JobFamily, JobOutput};

use crate::transform::Transformer;

/// One unit of work travelling through the pool: the job plus the reply
/// channel its submitter is waiting on.
struct WorkItem {
    job: Job,
    reply: oneshot::Sender<AppResult<JobOutput>>,
}

/// A bounded pool of execution units for one job family.
///
/// Constructed once at process start and passed by handle into the
/// dispatcher; each family gets its own independently sized pool so a
/// backlog of heavy document conversions cannot starve image jobs.
#[derive(Debug)]
pub struct WorkerPool {
    family: JobFamily,
    tx: mpsc::Sender<WorkItem>,
    dispatch_timeout: Duration,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn a pool of `config.workers` long-lived worker tasks.
    pub fn new(family: JobFamily, config: &PoolConfig, transformer: Arc<dyn Transformer>) -> Self {
        let workers = config.workers.max(1);
        let backlog = config.backlog.max(1);
        let (tx, rx) = mpsc::channel::<WorkItem>(backlog);
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..workers)
            .map(|index| {
                let rx = Arc::clone(&rx);
                let transformer = Arc::clone(&transformer);
                tokio::spawn(worker_loop(family, index, rx, transformer))
            })
            .collect();

        info!(
            family = %family,
            workers,
            backlog,
            dispatch_timeout_ms = config.dispatch_timeout_ms,
            "Worker pool started"
        );

        Self {
            family,
            tx,
            dispatch_timeout: Duration::from_millis(config.dispatch_timeout_ms),
            handles,
        }
    }

    /// The family this pool executes.
    pub fn family(&self) -> JobFamily {
        self.family
    }

    /// Execute one job and wait for its result.
    ///
    /// Fails with a saturation error if the backlog stays full for the
    /// configured dispatch timeout. A transformation error propagates as
    /// this call's error; it never takes down the pool or affects
    /// concurrently running jobs.
    pub async fn run(&self, job: Job) -> AppResult<JobOutput> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let item = WorkItem {
            job,
            reply: reply_tx,
        };

        match self.tx.try_send(item) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(item)) => {
                debug!(family = %self.family, "Pool backlog full, waiting for capacity");
                match tokio::time::timeout(self.dispatch_timeout, self.tx.send(item)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => {
                        return Err(AppError::service_unavailable(format!(
                            "{} pool is shut down",
                            self.family
                        )));
                    }
                    Err(_) => {
                        return Err(AppError::saturated(format!(
                            "{} pool backlog is full",
                            self.family
                        )));
                    }
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                return Err(AppError::service_unavailable(format!(
                    "{} pool is shut down",
                    self.family
                )));
            }
        }

        reply_rx.await.map_err(|_| {
            AppError::internal(format!("{} pool worker dropped the job reply", self.family))
        })?
    }

    /// Stop accepting work and wait for in-flight jobs to finish.
    pub async fn shutdown(self) {
        info!(family = %self.family, "Worker pool shutting down");
        drop(self.tx);
        for handle in self.handles {
            let _ = handle.await;
        }
        info!(family = %self.family, "Worker pool shut down complete");
    }
}

/// A worker task: pulls one job at a time and runs the transformation.
///
/// A panic inside a transformation is caught here, at the job boundary,
/// and surfaced to the submitter as a failure; the worker task itself
/// keeps serving subsequent jobs.
async fn worker_loop(
    family: JobFamily,
    index: usize,
    rx: Arc<Mutex<mpsc::Receiver<WorkItem>>>,
    transformer: Arc<dyn Transformer>,
) {
    loop {
        let item = {
            let mut guard = rx.lock().await;
            guard.recv().await
        };
        let Some(WorkItem { job, reply }) = item else {
            debug!(family = %family, worker = index, "Work channel closed, worker exiting");
            break;
        };

        let job_id = job.id;
        let task = job.task.clone();
        debug!(family = %family, worker = index, job_id = %job_id, task = %task, "Job picked up");

        let result = std::panic::AssertUnwindSafe(transformer.apply(&job))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                error!(family = %family, worker = index, job_id = %job_id, "Transformation panicked");
                Err(AppError::transformation(format!(
                    "{task} transformation panicked"
                )))
            });

        match &result {
            Ok(output) => {
                debug!(
                    family = %family,
                    worker = index,
                    job_id = %job_id,
                    output_key = %output.key,
                    "Job transformation finished"
                );
            }
            Err(e) => {
                debug!(
                    family = %family,
                    worker = index,
                    job_id = %job_id,
                    error = %e,
                    "Job transformation failed"
                );
            }
        }

        // The submitter may have gone away; nobody to tell is fine.
        let _ = reply.send(result);
    }
}

//! Submission job queue with bounded backpressure and retry
//!
//! Jobs flow through a bounded channel into a worker pool. Each worker runs
//! the dispatch steps under a timeout and retries recoverable failures with
//! exponential backoff. Unrecoverable failures stop immediately.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use uuid::Uuid;

use formgate_core::models::SubmissionJobPayload;
use formgate_core::{Config, JobError};

use crate::context::JobHandlerContext;

/// Ceiling for the exponential retry backoff.
pub const MAX_RETRY_BACKOFF_SECS: u64 = 300;

/// Backoff before retry attempt `retry_count + 1`, in seconds.
/// Grows as 1, 2, 4, ... and is capped at [`MAX_RETRY_BACKOFF_SECS`].
#[inline]
pub(crate) fn compute_retry_backoff_seconds(retry_count: u32) -> u64 {
    (2_u64.pow(retry_count)).min(MAX_RETRY_BACKOFF_SECS)
}

/// Lifecycle of a queued submission job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Enqueued,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Enqueued => "enqueued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for JobStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enqueued" => Ok(JobStatus::Enqueued),
            "running" => Ok(JobStatus::Running),
            "completed" => Ok(JobStatus::Completed),
            "failed" => Ok(JobStatus::Failed),
            _ => Err(anyhow::anyhow!("Invalid job status: {}", s)),
        }
    }
}

/// A submission dispatch job as carried through the queue.
#[derive(Debug, Clone)]
pub struct SubmissionJob {
    pub id: Uuid,
    pub payload: SubmissionJobPayload,
    pub retry_count: u32,
    pub max_retries: u32,
    pub timeout_seconds: u64,
}

impl SubmissionJob {
    fn new(payload: SubmissionJobPayload, config: &JobQueueConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload,
            retry_count: 0,
            max_retries: config.max_retries,
            timeout_seconds: config.job_timeout_seconds,
        }
    }

    pub fn can_retry(&self) -> bool {
        self.retry_count < self.max_retries
    }
}

/// Sender for job status transitions (Running, then Completed or Failed).
pub type JobStatusSender = mpsc::Sender<(Uuid, JobStatus)>;

/// Tuning for the submission job queue.
#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    pub queue_size: usize,
    pub max_workers: usize,
    pub job_timeout_seconds: u64,
    pub max_retries: u32,
}

impl Default for JobQueueConfig {
    fn default() -> Self {
        Self {
            queue_size: 1000,
            max_workers: 4,
            job_timeout_seconds: 600,
            max_retries: 3,
        }
    }
}

impl JobQueueConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            queue_size: config.job_queue_size(),
            max_workers: config.job_queue_max_workers(),
            job_timeout_seconds: config.job_timeout_seconds(),
            max_retries: config.job_max_retries(),
        }
    }
}

/// In-process queue that executes submission dispatch jobs off the request
/// path. Cheap to clone; clones share the same channel and worker pool.
pub struct SubmissionJobQueue {
    tx: mpsc::Sender<SubmissionJob>,
    config: JobQueueConfig,
    shutdown_tx: mpsc::Sender<()>,
}

impl SubmissionJobQueue {
    /// Start the queue and its worker pool.
    ///
    /// The context is held weakly so the queue never keeps application state
    /// alive; `job_status_tx` receives every status transition when present.
    pub fn new(
        config: JobQueueConfig,
        context: Weak<dyn JobHandlerContext>,
        job_status_tx: Option<JobStatusSender>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_size.max(1));
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let pool_config = config.clone();
        tokio::spawn(async move {
            Self::worker_pool(rx, pool_config, context, shutdown_rx, job_status_tx).await;
        });

        tracing::info!(
            queue_size = config.queue_size,
            max_workers = config.max_workers,
            "Submission job queue started"
        );

        Self {
            tx,
            config,
            shutdown_tx,
        }
    }

    /// Submit a job for dispatch without waiting. Fails fast when the queue
    /// is full so the caller can surface the rejection.
    #[tracing::instrument(skip(self, payload), fields(form.id = payload.form_id))]
    pub fn submit(&self, payload: SubmissionJobPayload) -> Result<Uuid> {
        let job = SubmissionJob::new(payload, &self.config);
        let job_id = job.id;

        self.tx.try_send(job).map_err(|e| match &e {
            TrySendError::Full(_) => {
                tracing::warn!(job_id = %job_id, "Submission job queue is full, rejecting job");
                anyhow::anyhow!("Submission queue is full, please try again later")
            }
            TrySendError::Closed(_) => {
                anyhow::anyhow!("Submission queue is shut down")
            }
        })?;

        tracing::info!(job_id = %job_id, "Submission dispatch job enqueued");
        Ok(job_id)
    }

    /// Submit a job, waiting for capacity when the queue is full.
    pub async fn submit_async(&self, payload: SubmissionJobPayload) -> Result<Uuid> {
        let job = SubmissionJob::new(payload, &self.config);
        let job_id = job.id;

        self.tx
            .send(job)
            .await
            .map_err(|_| anyhow::anyhow!("Submission queue is shut down"))?;

        tracing::info!(job_id = %job_id, "Submission dispatch job enqueued");
        Ok(job_id)
    }

    /// Signal the worker pool to stop taking jobs. Jobs already handed to a
    /// worker run to completion.
    pub async fn shutdown(&self) {
        tracing::info!("Initiating submission queue shutdown");
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn worker_pool(
        mut rx: mpsc::Receiver<SubmissionJob>,
        config: JobQueueConfig,
        context: Weak<dyn JobHandlerContext>,
        mut shutdown_rx: mpsc::Receiver<()>,
        job_status_tx: Option<JobStatusSender>,
    ) {
        tracing::info!(max_workers = config.max_workers, "Submission worker pool started");
        let semaphore = Arc::new(Semaphore::new(config.max_workers));

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Submission worker pool received shutdown signal");
                    break;
                }
                job = rx.recv() => {
                    let Some(job) = job else {
                        break;
                    };

                    // Holding the permit result is enough to reserve a worker
                    // slot; it releases when the spawned task finishes.
                    let permit = semaphore.clone().acquire_owned().await;
                    let job_context = context.clone();
                    let status_tx = job_status_tx.clone();

                    tokio::spawn(async move {
                        let _permit = permit;
                        let job_id = job.id;
                        if let Err(e) =
                            Self::process_job_with_retry(job, job_context, status_tx).await
                        {
                            tracing::error!(
                                job_id = %job_id,
                                error = %e,
                                "Submission dispatch job failed permanently"
                            );
                        }
                    });
                }
            }
        }

        tracing::info!("Submission worker pool stopped");
    }

    #[tracing::instrument(
        skip(job, context, job_status_tx),
        fields(job.id = %job.id, form.id = job.payload.form_id)
    )]
    async fn process_job_with_retry(
        mut job: SubmissionJob,
        context: Weak<dyn JobHandlerContext>,
        job_status_tx: Option<JobStatusSender>,
    ) -> Result<()> {
        let timeout = Duration::from_secs(job.timeout_seconds);

        if let Some(ref tx) = job_status_tx {
            let _ = tx.send((job.id, JobStatus::Running)).await;
        }

        loop {
            let Some(ctx) = context.upgrade() else {
                if let Some(ref tx) = job_status_tx {
                    let _ = tx.send((job.id, JobStatus::Failed)).await;
                }
                return Err(anyhow::anyhow!(
                    "Job handler context was dropped, cannot process job"
                ));
            };

            let result = tokio::time::timeout(timeout, ctx.dispatch_job(&job)).await;

            match result {
                Ok(Ok(result)) => {
                    if let Some(ref tx) = job_status_tx {
                        let _ = tx.send((job.id, JobStatus::Completed)).await;
                    }
                    tracing::info!(result = %result, "Submission dispatch job completed");
                    return Ok(());
                }
                Ok(Err(e)) => {
                    let is_unrecoverable = e
                        .downcast_ref::<JobError>()
                        .map(|je| !je.is_recoverable())
                        .unwrap_or(false);

                    tracing::error!(
                        error = %e,
                        retry_count = job.retry_count,
                        max_retries = job.max_retries,
                        unrecoverable = is_unrecoverable,
                        "Submission dispatch attempt failed"
                    );

                    if is_unrecoverable {
                        if let Some(ref tx) = job_status_tx {
                            let _ = tx.send((job.id, JobStatus::Failed)).await;
                        }
                        tracing::error!("Job failed with unrecoverable error, not retrying");
                        return Err(e);
                    }

                    if job.can_retry() {
                        let backoff_seconds = compute_retry_backoff_seconds(job.retry_count);
                        job.retry_count += 1;
                        tracing::info!(
                            retry_count = job.retry_count,
                            backoff_seconds = backoff_seconds,
                            "Retrying submission dispatch job"
                        );
                        sleep(Duration::from_secs(backoff_seconds)).await;
                        continue;
                    }

                    if let Some(ref tx) = job_status_tx {
                        let _ = tx.send((job.id, JobStatus::Failed)).await;
                    }
                    tracing::error!("Job failed after exhausting retries");
                    return Err(e);
                }
                Err(_) => {
                    tracing::error!(
                        timeout_seconds = timeout.as_secs(),
                        retry_count = job.retry_count,
                        "Submission dispatch job timed out"
                    );

                    if job.can_retry() {
                        job.retry_count += 1;
                        continue;
                    }

                    if let Some(ref tx) = job_status_tx {
                        let _ = tx.send((job.id, JobStatus::Failed)).await;
                    }
                    return Err(anyhow::anyhow!(
                        "Job timed out after {} attempts",
                        job.retry_count + 1
                    ));
                }
            }
        }
    }
}

impl Clone for SubmissionJobQueue {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            config: self.config.clone(),
            shutdown_tx: self.shutdown_tx.clone(),
        }
    }
}

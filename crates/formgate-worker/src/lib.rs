//! Formgate Worker
//!
//! Background execution for submission dispatch: a bounded in-process job
//! queue with a worker pool, retry with exponential backoff, and the
//! dispatch handler that fetches the form snapshot and sends the
//! notification.

pub mod context;
pub mod queue;
pub mod submission;

pub use context::{empty_context_weak, JobHandlerContext};
pub use queue::{
    JobQueueConfig, JobStatus, JobStatusSender, SubmissionJob, SubmissionJobQueue,
    MAX_RETRY_BACKOFF_SECS,
};
pub use submission::SubmissionJobHandler;

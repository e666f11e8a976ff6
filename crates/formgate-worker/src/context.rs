//! Handler context trait for job execution
//!
//! The queue holds a weak reference to a context and dispatches each job
//! through it, so the queue never depends on the concrete handler wiring.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Weak};

use crate::queue::SubmissionJob;

/// Trait that gives the worker pool access to job handlers.
#[async_trait]
pub trait JobHandlerContext: Send + Sync {
    /// Dispatch a job to its handler and return the handler's result.
    async fn dispatch_job(self: Arc<Self>, job: &SubmissionJob) -> Result<serde_json::Value>;
}

/// Context that fails every dispatch. Used where a queue must exist before
/// the real handler wiring is available.
struct NoopContext;

#[async_trait]
impl JobHandlerContext for NoopContext {
    async fn dispatch_job(self: Arc<Self>, job: &SubmissionJob) -> Result<serde_json::Value> {
        Err(anyhow!(
            "No handler context available for job {}",
            job.id
        ))
    }
}

/// Returns a weak handle that never upgrades, for queues constructed without
/// a live context.
pub fn empty_context_weak() -> Weak<dyn JobHandlerContext> {
    let noop: Arc<dyn JobHandlerContext> = Arc::new(NoopContext);
    Arc::downgrade(&noop)
}

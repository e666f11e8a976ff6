//! Submission dispatch job
//!
//! Runs the steps that turn a queued submission payload into a delivered
//! notification: resolve the mode, format the completion timestamp, fetch
//! the form snapshot, reconstruct the completed form, build mailer options,
//! and hand off to the notification provider. The steps run in that order
//! and any failure aborts the rest.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use std::sync::Arc;

use formgate_core::models::{FormMode, FormSnapshot, MailerOptions, SubmissionContext, SubmissionJobPayload};
use formgate_core::{Config, JobError, JobResultExt};
use formgate_services::{FormsApiError, NotificationDispatch, SnapshotSource};

use crate::context::JobHandlerContext;
use crate::queue::SubmissionJob;

/// Notification timestamp rendering, e.g. "5 March 2026 at 2:45pm".
const TIMESTAMP_FORMAT: &str = "%-d %B %Y at %-I:%M%P";

/// Parse an RFC 3339 submission timestamp and render it in the given
/// timezone for display in the notification.
fn format_timestamp(raw: &str, timezone: Tz) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw)
        .with_context(|| format!("Invalid submission timestamp: {}", raw))?;
    Ok(parsed
        .with_timezone(&timezone)
        .format(TIMESTAMP_FORMAT)
        .to_string())
}

/// Assemble the options handed to notification dispatch. Requires a fetched
/// snapshot, so this can only run after the snapshot step has succeeded.
fn build_mailer_options(
    snapshot: &FormSnapshot,
    mode: FormMode,
    timestamp: String,
    submission_reference: &str,
) -> MailerOptions {
    let payment_link = snapshot.payment_url.as_ref().map(|url| {
        format!(
            "{}?reference={}",
            url.trim_end_matches('/'),
            urlencoding::encode(submission_reference)
        )
    });

    MailerOptions {
        title: snapshot.name.clone(),
        is_preview: mode.is_preview(),
        timestamp,
        submission_reference: submission_reference.to_string(),
        payment_link,
    }
}

/// Executes submission dispatch jobs against the forms API and the
/// notification provider. The queue reaches it through [`JobHandlerContext`].
pub struct SubmissionJobHandler {
    forms: Arc<dyn SnapshotSource>,
    dispatch: Arc<dyn NotificationDispatch>,
    timezone: Tz,
}

impl SubmissionJobHandler {
    pub fn new(
        forms: Arc<dyn SnapshotSource>,
        dispatch: Arc<dyn NotificationDispatch>,
        timezone: Tz,
    ) -> Self {
        Self {
            forms,
            dispatch,
            timezone,
        }
    }

    /// Build a handler using the configured submission timezone, falling back
    /// to UTC when the configured name is not a known timezone.
    pub fn from_config(
        config: &Config,
        forms: Arc<dyn SnapshotSource>,
        dispatch: Arc<dyn NotificationDispatch>,
    ) -> Self {
        let timezone = config.submission_timezone().parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(
                timezone = %config.submission_timezone(),
                "Unknown submission timezone, falling back to UTC"
            );
            chrono_tz::UTC
        });
        Self::new(forms, dispatch, timezone)
    }

    /// Run one dispatch job to completion.
    ///
    /// A form snapshot missing for the requested mode fails the job as
    /// unrecoverable; provider failures stay recoverable so the queue can
    /// retry them.
    pub async fn run(&self, payload: &SubmissionJobPayload) -> Result<serde_json::Value> {
        let start = std::time::Instant::now();

        let mode = payload.mode.parse::<FormMode>().unrecoverable()?;

        let timestamp = format_timestamp(&payload.timestamp, self.timezone).unrecoverable()?;

        let snapshot = match self.forms.fetch_snapshot(payload.form_id, mode).await {
            Ok(snapshot) => snapshot,
            Err(e @ FormsApiError::FormNotFound { .. }) => {
                return Err(JobError::unrecoverable(e).into());
            }
            Err(e) => return Err(e.into()),
        };

        let context = SubmissionContext::from_snapshot(&snapshot, &payload.answers);
        if context.submission_email.is_none() {
            return Err(JobError::unrecoverable(anyhow::anyhow!(
                "Form {} has no submission email configured",
                payload.form_id
            ))
            .into());
        }

        let options = build_mailer_options(&snapshot, mode, timestamp, &payload.submission_reference);

        let receipt = self
            .dispatch
            .send(&context, &payload.email_reference, &options)
            .await?;

        tracing::info!(
            form_id = payload.form_id,
            submission_reference = %payload.submission_reference,
            message_id = %receipt.message_id,
            duration_ms = start.elapsed().as_millis() as u64,
            "Submission dispatched"
        );

        Ok(serde_json::json!({
            "status": "success",
            "message_id": receipt.message_id,
            "submission_reference": payload.submission_reference,
        }))
    }
}

#[async_trait]
impl JobHandlerContext for SubmissionJobHandler {
    async fn dispatch_job(self: Arc<Self>, job: &SubmissionJob) -> Result<serde_json::Value> {
        self.run(&job.payload).await
    }
}

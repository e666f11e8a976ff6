//! Notification dispatch for completed submissions.
//!
//! One trait, two backends: a template-based notification API and plain SMTP.
//! The dispatch job treats both as the same external collaborator: provider
//! rejection is a send failure the job queue may retry.

pub mod api;
pub mod render;
#[cfg(feature = "notify-smtp")]
pub mod smtp;

use async_trait::async_trait;
use formgate_core::models::{MailerOptions, SubmissionContext};
use formgate_core::{Config, NotifyBackend};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

pub use api::NotifyApiDispatch;
#[cfg(feature = "notify-smtp")]
pub use smtp::SmtpDispatch;

/// Receipt returned by a provider that accepted a notification.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryReceipt {
    pub message_id: String,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to build notification: {0}")]
    Build(String),

    #[error("Notification send failed: {0}")]
    Send(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// External notification provider contract.
#[async_trait]
pub trait NotificationDispatch: Send + Sync {
    /// Send the submission notification.
    ///
    /// `email_reference` correlates the message with the provider's delivery
    /// records; providers deduplicate on it under job-queue retries. Provider
    /// rejection surfaces as [`NotifyError::Send`].
    async fn send(
        &self,
        context: &SubmissionContext,
        email_reference: &str,
        options: &MailerOptions,
    ) -> Result<DeliveryReceipt, NotifyError>;
}

/// Create a notification dispatch backend based on configuration
pub fn create_dispatch(config: &Config) -> Result<Arc<dyn NotificationDispatch>, NotifyError> {
    let backend = config.notify_backend().unwrap_or(NotifyBackend::Api);

    match backend {
        NotifyBackend::Api => {
            let dispatch = NotifyApiDispatch::from_config(config)?;
            Ok(Arc::new(dispatch))
        }

        #[cfg(feature = "notify-smtp")]
        NotifyBackend::Smtp => {
            let dispatch = SmtpDispatch::from_config(config)?;
            Ok(Arc::new(dispatch))
        }

        #[cfg(not(feature = "notify-smtp"))]
        NotifyBackend::Smtp => Err(NotifyError::ConfigError(
            "SMTP dispatch not available (notify-smtp feature not enabled)".to_string(),
        )),
    }
}

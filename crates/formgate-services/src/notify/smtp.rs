//! SMTP notification backend, for self-hosted deployments without a
//! notification provider.

use super::render;
use super::{DeliveryReceipt, NotificationDispatch, NotifyError};
use async_trait::async_trait;
use formgate_core::models::{MailerOptions, SubmissionContext};
use formgate_core::Config;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Sends submission notifications over SMTP.
#[derive(Clone)]
pub struct SmtpDispatch {
    mailer: Arc<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
}

impl SmtpDispatch {
    /// Create the dispatch from config. Fails if SMTP is not configured.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let host = config
            .smtp_host()
            .ok_or_else(|| NotifyError::ConfigError("SMTP_HOST not configured".to_string()))?;
        let from = config
            .smtp_from()
            .ok_or_else(|| NotifyError::ConfigError("SMTP_FROM not configured".to_string()))?
            .to_string();
        let port = config.smtp_port().unwrap_or(587);

        let mailer = if config.smtp_tls() {
            let b = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::ConfigError(format!("Invalid SMTP relay {}: {}", host, e)))?;
            let b = b.port(port);
            let b = if let (Some(u), Some(p)) = (config.smtp_user(), config.smtp_password()) {
                b.credentials(Credentials::new(u.to_string(), p.to_string()))
            } else {
                b
            };
            tracing::info!(
                host = %host,
                port = port,
                "SMTP dispatch initialized (STARTTLS)"
            );
            b.build()
        } else {
            let b = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port);
            let b = if let (Some(u), Some(p)) = (config.smtp_user(), config.smtp_password()) {
                b.credentials(Credentials::new(u.to_string(), p.to_string()))
            } else {
                b
            };
            tracing::info!(host = %host, port = port, "SMTP dispatch initialized");
            b.build()
        };

        Ok(Self {
            mailer: Arc::new(mailer),
            from,
        })
    }
}

#[async_trait]
impl NotificationDispatch for SmtpDispatch {
    async fn send(
        &self,
        context: &SubmissionContext,
        email_reference: &str,
        options: &MailerOptions,
    ) -> Result<DeliveryReceipt, NotifyError> {
        let to = context.submission_email.as_deref().ok_or_else(|| {
            NotifyError::Build("Submission has no delivery address".to_string())
        })?;
        let to_addr: Mailbox = to
            .parse()
            .map_err(|e| NotifyError::Build(format!("Invalid recipient address: {}", e)))?;
        let from_addr: Mailbox = self
            .from
            .parse()
            .map_err(|e| NotifyError::ConfigError(format!("Invalid SMTP_FROM: {}", e)))?;

        let email = Message::builder()
            .from(from_addr)
            .to(to_addr)
            .subject(render::subject(options))
            .header(ContentType::TEXT_PLAIN)
            .body(render::plain_body(context, options))
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        tracing::info!(reference = %email_reference, "Submission email sent");

        // SMTP has no provider-side message id; the reference stands in.
        Ok(DeliveryReceipt {
            message_id: email_reference.to_string(),
        })
    }
}

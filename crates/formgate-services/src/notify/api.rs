//! Template-based notification API backend.
//!
//! Speaks the `POST /v2/notifications/email` contract: template id plus a
//! personalisation map, authenticated with a bearer token. The provider
//! deduplicates on the caller-supplied reference.

use super::render;
use super::{DeliveryReceipt, NotificationDispatch, NotifyError};
use async_trait::async_trait;
use formgate_core::models::{MailerOptions, SubmissionContext};
use formgate_core::Config;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    email_address: &'a str,
    template_id: &'a str,
    personalisation: Map<String, Value>,
    reference: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: String,
}

/// Notification API client.
#[derive(Clone, Debug)]
pub struct NotifyApiDispatch {
    client: Client,
    base_url: String,
    api_key: String,
    template_id: String,
}

impl NotifyApiDispatch {
    pub fn new(
        base_url: String,
        api_key: String,
        template_id: String,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| NotifyError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            template_id,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let base_url = config
            .notify_api_url()
            .map(String::from)
            .ok_or_else(|| NotifyError::ConfigError("NOTIFY_API_URL not configured".to_string()))?;
        let api_key = config
            .notify_api_key()
            .map(String::from)
            .ok_or_else(|| NotifyError::ConfigError("NOTIFY_API_KEY not configured".to_string()))?;
        let template_id = config.notify_template_id().map(String::from).ok_or_else(|| {
            NotifyError::ConfigError("NOTIFY_TEMPLATE_ID not configured".to_string())
        })?;

        Self::new(base_url, api_key, template_id)
    }
}

#[async_trait]
impl NotificationDispatch for NotifyApiDispatch {
    async fn send(
        &self,
        context: &SubmissionContext,
        email_reference: &str,
        options: &MailerOptions,
    ) -> Result<DeliveryReceipt, NotifyError> {
        let email_address = context.submission_email.as_deref().ok_or_else(|| {
            NotifyError::Build("Submission has no delivery address".to_string())
        })?;

        let body = SendEmailRequest {
            email_address,
            template_id: &self.template_id,
            personalisation: render::personalisation(context, options),
            reference: email_reference,
        };

        let url = format!("{}/v2/notifications/email", self.base_url);
        let request = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body);

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NotifyError::Send(format!(
                "Notification API request failed with status {}: {}",
                status, error_text
            )));
        }

        let parsed: SendEmailResponse = response
            .json()
            .await
            .map_err(|e| NotifyError::Send(format!("Failed to parse notification response: {}", e)))?;

        tracing::info!(
            message_id = %parsed.id,
            reference = %email_reference,
            "Notification accepted by provider"
        );

        Ok(DeliveryReceipt {
            message_id: parsed.id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let dispatch = NotifyApiDispatch::new(
            "https://notify.example.gov.uk/".to_string(),
            "key".to_string(),
            "template-1".to_string(),
        )
        .unwrap();
        assert_eq!(dispatch.base_url, "https://notify.example.gov.uk");
    }
}

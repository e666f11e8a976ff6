//! Client for the forms API.
//!
//! Fetches read-only form snapshots by (form id, mode). The dispatch job
//! re-fetches the form when it runs rather than trusting whatever structure
//! the session saw, so archived or edited forms are rendered as the API
//! serves them at dispatch time.

use async_trait::async_trait;
use formgate_core::models::{FormMode, FormSnapshot};
use formgate_core::Config;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormsApiError {
    #[error("Form {form_id} not found in mode {mode}")]
    FormNotFound { form_id: i64, mode: FormMode },

    #[error("Forms API request failed with status {status}: {body}")]
    Request { status: u16, body: String },

    #[error("Forms API transport error: {0}")]
    Transport(String),

    #[error("Failed to decode forms API response: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Source of read-only form snapshots.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch the snapshot of a form for the given mode.
    ///
    /// Fails with [`FormsApiError::FormNotFound`] when no such form exists in
    /// that mode; callers treat that as fatal rather than retryable.
    async fn fetch_snapshot(
        &self,
        form_id: i64,
        mode: FormMode,
    ) -> Result<FormSnapshot, FormsApiError>;
}

fn snapshot_path(form_id: i64, mode: FormMode) -> String {
    format!("/api/v1/forms/{}/{}", form_id, mode.api_segment())
}

/// HTTP client for the forms API.
#[derive(Clone, Debug)]
pub struct FormsApiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl FormsApiClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Result<Self, FormsApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| FormsApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, FormsApiError> {
        let base_url = config
            .forms_api_url()
            .map(String::from)
            .ok_or_else(|| FormsApiError::ConfigError("FORMS_API_URL not configured".to_string()))?;
        let api_key = config.forms_api_key().map(String::from);

        Self::new(base_url, api_key)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn apply_auth(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("X-API-Key", key.as_str()),
            None => request,
        }
    }
}

#[async_trait]
impl SnapshotSource for FormsApiClient {
    async fn fetch_snapshot(
        &self,
        form_id: i64,
        mode: FormMode,
    ) -> Result<FormSnapshot, FormsApiError> {
        let url = self.build_url(&snapshot_path(form_id, mode));
        let request = self.apply_auth(self.client.get(&url));

        let response = request
            .send()
            .await
            .map_err(|e| FormsApiError::Transport(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FormsApiError::FormNotFound { form_id, mode });
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FormsApiError::Request {
                status: status.as_u16(),
                body,
            });
        }

        let snapshot: FormSnapshot = response
            .json()
            .await
            .map_err(|e| FormsApiError::Decode(e.to_string()))?;

        tracing::debug!(
            form_id = form_id,
            mode = %mode,
            steps = snapshot.steps.len(),
            "Fetched form snapshot"
        );

        Ok(snapshot)
    }
}

//! Configuration module
//!
//! Environment-backed configuration for the submission pipeline: storage,
//! scanning, forms API, notification dispatch, and the job queue. Components
//! never read the environment themselves; they receive settings through
//! injected config structs built from this one.

use std::env;

use crate::backends::{NotifyBackend, ScanSourceKind, StorageBackend};

/// Base configuration shared by all components
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub environment: String,
    /// IANA timezone name used when rendering submission timestamps.
    pub submission_timezone: String,
}

/// Form runner configuration
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    // Upload validation
    pub max_upload_size_bytes: usize,
    pub allowed_extensions: Vec<String>,
    pub allowed_content_types: Vec<String>,
    // Scan configuration
    pub scan_source: Option<ScanSourceKind>,
    pub scan_max_wait_seconds: u64,
    pub scan_poll_interval_ms: u64,
    pub clamav_host: String,
    pub clamav_port: u16,
    pub clamav_timeout_secs: u64,
    // Forms API
    pub forms_api_url: Option<String>,
    pub forms_api_key: Option<String>,
    // Notification dispatch
    pub notify_backend: Option<NotifyBackend>,
    pub notify_api_url: Option<String>,
    pub notify_api_key: Option<String>,
    pub notify_template_id: Option<String>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: Option<String>,
    pub smtp_tls: bool,
    // Submission job queue
    pub job_queue_size: usize,
    pub job_queue_max_workers: usize,
    pub job_timeout_seconds: u64,
    pub job_max_retries: u32,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<RunnerConfig>);

impl Config {
    fn inner(&self) -> &RunnerConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let environment = self.inner().base.environment.to_lowercase();
        environment == "production" || environment == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = RunnerConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    // Convenience getters for common fields

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn submission_timezone(&self) -> &str {
        &self.inner().base.submission_timezone
    }

    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.inner().aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.inner().allowed_extensions
    }

    pub fn allowed_content_types(&self) -> &[String] {
        &self.inner().allowed_content_types
    }

    pub fn scan_source(&self) -> Option<ScanSourceKind> {
        self.inner().scan_source
    }

    pub fn scan_max_wait_seconds(&self) -> u64 {
        self.inner().scan_max_wait_seconds
    }

    pub fn scan_poll_interval_ms(&self) -> u64 {
        self.inner().scan_poll_interval_ms
    }

    pub fn clamav_host(&self) -> &str {
        &self.inner().clamav_host
    }

    pub fn clamav_port(&self) -> u16 {
        self.inner().clamav_port
    }

    pub fn clamav_timeout_secs(&self) -> u64 {
        self.inner().clamav_timeout_secs
    }

    pub fn forms_api_url(&self) -> Option<&str> {
        self.inner().forms_api_url.as_deref()
    }

    pub fn forms_api_key(&self) -> Option<&str> {
        self.inner().forms_api_key.as_deref()
    }

    pub fn notify_backend(&self) -> Option<NotifyBackend> {
        self.inner().notify_backend
    }

    pub fn notify_api_url(&self) -> Option<&str> {
        self.inner().notify_api_url.as_deref()
    }

    pub fn notify_api_key(&self) -> Option<&str> {
        self.inner().notify_api_key.as_deref()
    }

    pub fn notify_template_id(&self) -> Option<&str> {
        self.inner().notify_template_id.as_deref()
    }

    pub fn smtp_host(&self) -> Option<&str> {
        self.inner().smtp_host.as_deref()
    }

    pub fn smtp_port(&self) -> Option<u16> {
        self.inner().smtp_port
    }

    pub fn smtp_user(&self) -> Option<&str> {
        self.inner().smtp_user.as_deref()
    }

    pub fn smtp_password(&self) -> Option<&str> {
        self.inner().smtp_password.as_deref()
    }

    pub fn smtp_from(&self) -> Option<&str> {
        self.inner().smtp_from.as_deref()
    }

    pub fn smtp_tls(&self) -> bool {
        self.inner().smtp_tls
    }

    pub fn job_queue_size(&self) -> usize {
        self.inner().job_queue_size
    }

    pub fn job_queue_max_workers(&self) -> usize {
        self.inner().job_queue_max_workers
    }

    pub fn job_timeout_seconds(&self) -> u64 {
        self.inner().job_timeout_seconds
    }

    pub fn job_max_retries(&self) -> u32 {
        self.inner().job_max_retries
    }
}

impl RunnerConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        const MAX_UPLOAD_SIZE_MB: usize = 7;
        const SCAN_MAX_WAIT_SECONDS: u64 = 30;
        const SCAN_POLL_INTERVAL_MS: u64 = 1000;
        const CLAMAV_TIMEOUT_SECS: u64 = 30;
        const JOB_QUEUE_SIZE: usize = 1000;
        const JOB_QUEUE_MAX_WORKERS: usize = 4;
        const JOB_TIMEOUT_SECONDS: u64 = 600;
        const JOB_MAX_RETRIES: u32 = 3;

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let base = BaseConfig {
            environment,
            submission_timezone: env::var("SUBMISSION_TIMEZONE")
                .unwrap_or_else(|_| "UTC".to_string()),
        };

        let storage_backend = env::var("STORAGE_BACKEND")
            .ok()
            .and_then(|s| s.parse::<StorageBackend>().ok());

        let scan_source = env::var("SCAN_SOURCE")
            .ok()
            .and_then(|s| s.parse::<ScanSourceKind>().ok());

        let notify_backend = env::var("NOTIFY_BACKEND")
            .ok()
            .and_then(|s| s.parse::<NotifyBackend>().ok());

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let allowed_extensions = env::var("ALLOWED_EXTENSIONS")
            .unwrap_or_else(|_| "csv,doc,docx,jpeg,jpg,json,odt,pdf,png,rtf,txt,xls,xlsx".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let allowed_content_types = env::var("ALLOWED_CONTENT_TYPES")
            .unwrap_or_else(|_| {
                [
                    "text/csv",
                    "application/msword",
                    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
                    "image/jpeg",
                    "application/json",
                    "application/vnd.oasis.opendocument.text",
                    "application/pdf",
                    "image/png",
                    "application/rtf",
                    "text/plain",
                    "application/vnd.ms-excel",
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ]
                .join(",")
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .collect();

        let config = RunnerConfig {
            base,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            aws_region: env::var("AWS_REGION").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            allowed_extensions,
            allowed_content_types,
            scan_source,
            scan_max_wait_seconds: env::var("SCAN_MAX_WAIT_SECONDS")
                .unwrap_or_else(|_| SCAN_MAX_WAIT_SECONDS.to_string())
                .parse()
                .unwrap_or(SCAN_MAX_WAIT_SECONDS),
            scan_poll_interval_ms: env::var("SCAN_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| SCAN_POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(SCAN_POLL_INTERVAL_MS),
            clamav_host: env::var("CLAMAV_HOST").unwrap_or_else(|_| "localhost".to_string()),
            clamav_port: env::var("CLAMAV_PORT")
                .unwrap_or_else(|_| "3310".to_string())
                .parse()
                .unwrap_or(3310),
            clamav_timeout_secs: env::var("CLAMAV_TIMEOUT_SECS")
                .unwrap_or_else(|_| CLAMAV_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CLAMAV_TIMEOUT_SECS),
            forms_api_url: env::var("FORMS_API_URL").ok(),
            forms_api_key: env::var("FORMS_API_KEY").ok(),
            notify_backend,
            notify_api_url: env::var("NOTIFY_API_URL").ok(),
            notify_api_key: env::var("NOTIFY_API_KEY").ok(),
            notify_template_id: env::var("NOTIFY_TEMPLATE_ID").ok(),
            smtp_host: env::var("SMTP_HOST").ok(),
            smtp_port: env::var("SMTP_PORT").ok().and_then(|s| s.parse().ok()),
            smtp_user: env::var("SMTP_USER").ok(),
            smtp_password: env::var("SMTP_PASSWORD").ok(),
            smtp_from: env::var("SMTP_FROM").ok(),
            smtp_tls: env::var("SMTP_TLS")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            job_queue_size: env::var("JOB_QUEUE_SIZE")
                .unwrap_or_else(|_| JOB_QUEUE_SIZE.to_string())
                .parse()
                .unwrap_or(JOB_QUEUE_SIZE)
                .max(1),
            job_queue_max_workers: env::var("JOB_QUEUE_MAX_WORKERS")
                .unwrap_or_else(|_| JOB_QUEUE_MAX_WORKERS.to_string())
                .parse()
                .unwrap_or(JOB_QUEUE_MAX_WORKERS)
                .max(1),
            job_timeout_seconds: env::var("JOB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| JOB_TIMEOUT_SECONDS.to_string())
                .parse()
                .unwrap_or(JOB_TIMEOUT_SECONDS),
            job_max_retries: env::var("JOB_MAX_RETRIES")
                .unwrap_or_else(|_| JOB_MAX_RETRIES.to_string())
                .parse()
                .unwrap_or(JOB_MAX_RETRIES),
        };

        Ok(config)
    }
}

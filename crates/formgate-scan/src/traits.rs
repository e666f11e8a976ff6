use crate::ScanVerdict;
use async_trait::async_trait;
use formgate_core::ScanSourceKind;
use formgate_storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Scan verdict for {key} not available after {waited_ms}ms")]
    PollTimeout { key: String, waited_ms: u64 },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Malformed scan verdict for {key}: {reason}")]
    MalformedVerdict { key: String, reason: String },

    #[error("Scanner error: {0}")]
    Scanner(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type ScanResult<T> = Result<T, ScanError>;

/// Source of malware scan verdicts for stored objects.
#[async_trait]
pub trait VerdictSource: Send + Sync {
    /// Fetch the current verdict for a stored object.
    ///
    /// Returns `Ok(None)` while the scan is still in progress. Sources that
    /// scan synchronously always return a terminal verdict or an error.
    async fn fetch_verdict(&self, key: &str) -> ScanResult<Option<ScanVerdict>>;

    /// Get the source kind identifier
    fn source_kind(&self) -> ScanSourceKind;
}

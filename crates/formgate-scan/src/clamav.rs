use crate::traits::{ScanError, ScanResult, VerdictSource};
use crate::ScanVerdict;
use async_trait::async_trait;
use clamav_client::{clean, Tcp};
use formgate_core::ScanSourceKind;
use formgate_storage::Storage;
use std::str;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Scans objects on demand against a ClamAV daemon.
///
/// Downloads the object and scans it over the clamd TCP protocol. Verdicts
/// are always terminal: this source never reports a pending scan, and a key
/// that was never stored surfaces as a storage error.
pub struct ClamAvVerdictSource {
    storage: Arc<dyn Storage>,
    host: String,
    port: u16,
    /// Timeout in seconds for each scan operation (default: 30)
    timeout_secs: u64,
}

/// Pull the threat name out of a clamd scan response.
///
/// Positive responses look like `stream: Eicar-Test-Signature FOUND`.
fn threat_name_from_response(response: &[u8]) -> String {
    let response_str = match str::from_utf8(response) {
        Ok(s) => s.trim(),
        Err(_) => return "unknown".to_string(),
    };
    if !response_str.contains("FOUND") {
        return "unknown".to_string();
    }
    response_str
        .split(':')
        .nth(1)
        .unwrap_or("unknown")
        .split_whitespace()
        .next()
        .unwrap_or("unknown")
        .to_string()
}

impl ClamAvVerdictSource {
    pub fn new(storage: Arc<dyn Storage>, host: String, port: u16) -> Self {
        Self::with_timeout(storage, host, port, 30)
    }

    /// Create with a custom scan timeout (for large files or slow ClamAV instances).
    pub fn with_timeout(
        storage: Arc<dyn Storage>,
        host: String,
        port: u16,
        timeout_secs: u64,
    ) -> Self {
        Self {
            storage,
            host,
            port,
            timeout_secs,
        }
    }

    /// Scan in-memory data using sync API inside spawn_blocking to avoid !Send tokio futures.
    async fn scan_bytes(&self, data: Vec<u8>) -> ScanResult<ScanVerdict> {
        let start = Instant::now();
        tracing::debug!(host = %self.host, port = %self.port, "Starting ClamAV scan");
        let host = self.host.clone();
        let port = self.port;
        let timeout_secs = self.timeout_secs;

        let result = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            tokio::task::spawn_blocking(move || {
                let address = format!("{}:{}", host, port);
                let connection = Tcp {
                    host_address: address.as_str(),
                };
                let response_bytes = clamav_client::scan_buffer(data.as_slice(), connection, None)
                    .map_err(|e| ScanError::Scanner(format!("ClamAV scan error: {}", e)))?;
                let is_clean = clean(&response_bytes).map_err(|e| {
                    ScanError::Scanner(format!("Failed to parse ClamAV response: {}", e))
                })?;

                if is_clean {
                    tracing::info!(
                        duration_ms = start.elapsed().as_millis(),
                        "File scan completed: clean"
                    );
                    Ok(ScanVerdict::Clean)
                } else {
                    let virus_name = threat_name_from_response(&response_bytes);
                    tracing::warn!(
                        duration_ms = start.elapsed().as_millis(),
                        virus = %virus_name,
                        "File scan detected virus"
                    );
                    Ok(ScanVerdict::ThreatsFound(virus_name))
                }
            }),
        )
        .await;

        match result {
            Ok(Ok(verdict)) => verdict,
            Ok(Err(e)) => Err(ScanError::Scanner(format!(
                "ClamAV scan task join error: {}",
                e
            ))),
            Err(_) => Err(ScanError::Scanner(format!(
                "ClamAV scan timeout (exceeded {} seconds)",
                timeout_secs
            ))),
        }
    }
}

#[async_trait]
impl VerdictSource for ClamAvVerdictSource {
    async fn fetch_verdict(&self, key: &str) -> ScanResult<Option<ScanVerdict>> {
        let data = self.storage.get(key).await?;
        let verdict = self.scan_bytes(data).await?;
        Ok(Some(verdict))
    }

    fn source_kind(&self) -> ScanSourceKind {
        ScanSourceKind::Clamav
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_storage::LocalStorage;
    use tempfile::tempdir;

    #[test]
    fn test_threat_name_from_positive_response() {
        assert_eq!(
            threat_name_from_response(b"stream: Eicar-Test-Signature FOUND\0"),
            "Eicar-Test-Signature"
        );
    }

    #[test]
    fn test_threat_name_defaults_to_unknown() {
        assert_eq!(threat_name_from_response(b"stream: OK\0"), "unknown");
        assert_eq!(threat_name_from_response(&[0xff, 0xfe]), "unknown");
    }

    #[tokio::test]
    async fn clamav_constructors() {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()).await.unwrap());

        let _src = ClamAvVerdictSource::new(storage.clone(), "localhost".to_string(), 3310);
        let _src_custom =
            ClamAvVerdictSource::with_timeout(storage, "localhost".to_string(), 3310, 60);
    }

    #[tokio::test]
    async fn test_missing_object_is_a_storage_error() {
        let dir = tempdir().unwrap();
        let storage: Arc<dyn Storage> = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let source = ClamAvVerdictSource::new(storage, "localhost".to_string(), 3310);

        let result = source.fetch_verdict("uploads/REF23456/never-stored.pdf").await;
        assert!(matches!(result, Err(ScanError::Storage(_))));
    }
}

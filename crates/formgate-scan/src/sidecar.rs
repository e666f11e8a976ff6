use crate::traits::{ScanError, ScanResult, VerdictSource};
use crate::ScanVerdict;
use async_trait::async_trait;
use formgate_core::ScanSourceKind;
use formgate_storage::{Storage, StorageError};
use serde::Deserialize;
use std::sync::Arc;

/// Prefix under which the scanning pipeline writes verdict objects.
pub const SCAN_RESULTS_PREFIX: &str = "scan-results/";

/// Shape of a verdict object as written by the scanning pipeline.
#[derive(Debug, Deserialize)]
struct SidecarRecord {
    status: String,
    #[serde(default)]
    threat_name: Option<String>,
}

/// Reads scan verdicts from sidecar objects in the same store as the uploads.
///
/// The scanning pipeline writes a small JSON object to `scan-results/{key}`
/// once the scan of `{key}` completes. Absence of the sidecar means the scan
/// is still pending, including for keys that were never stored at all.
pub struct SidecarVerdictSource {
    storage: Arc<dyn Storage>,
}

impl SidecarVerdictSource {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    fn verdict_key(key: &str) -> String {
        format!("{}{}", SCAN_RESULTS_PREFIX, key)
    }

    fn parse_record(record: SidecarRecord) -> ScanVerdict {
        match record.status.as_str() {
            "NO_THREATS_FOUND" => ScanVerdict::Clean,
            "THREATS_FOUND" => ScanVerdict::ThreatsFound(
                record.threat_name.unwrap_or_else(|| "unknown".to_string()),
            ),
            other => ScanVerdict::Failed(format!("scanner reported status {}", other)),
        }
    }
}

#[async_trait]
impl VerdictSource for SidecarVerdictSource {
    async fn fetch_verdict(&self, key: &str) -> ScanResult<Option<ScanVerdict>> {
        let verdict_key = Self::verdict_key(key);

        let bytes = match self.storage.get(&verdict_key).await {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(ScanError::Storage(e)),
        };

        let record: SidecarRecord =
            serde_json::from_slice(&bytes).map_err(|e| ScanError::MalformedVerdict {
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Some(Self::parse_record(record)))
    }

    fn source_kind(&self) -> ScanSourceKind {
        ScanSourceKind::Sidecar
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_storage::LocalStorage;
    use tempfile::tempdir;

    async fn source_with_sidecar(
        dir: &std::path::Path,
        key: &str,
        sidecar_json: Option<&str>,
    ) -> SidecarVerdictSource {
        let storage = LocalStorage::new(dir).await.unwrap();
        if let Some(json) = sidecar_json {
            storage
                .put(
                    &SidecarVerdictSource::verdict_key(key),
                    json.as_bytes().to_vec(),
                    "application/json",
                )
                .await
                .unwrap();
        }
        SidecarVerdictSource::new(Arc::new(storage))
    }

    #[tokio::test]
    async fn test_missing_sidecar_means_pending() {
        let dir = tempdir().unwrap();
        let source = source_with_sidecar(dir.path(), "uploads/REF23456/file.pdf", None).await;

        let verdict = source
            .fetch_verdict("uploads/REF23456/file.pdf")
            .await
            .unwrap();
        assert_eq!(verdict, None);
    }

    #[tokio::test]
    async fn test_no_threats_found_is_clean() {
        let dir = tempdir().unwrap();
        let source = source_with_sidecar(
            dir.path(),
            "uploads/REF23456/file.pdf",
            Some(r#"{"status": "NO_THREATS_FOUND"}"#),
        )
        .await;

        let verdict = source
            .fetch_verdict("uploads/REF23456/file.pdf")
            .await
            .unwrap();
        assert_eq!(verdict, Some(ScanVerdict::Clean));
    }

    #[tokio::test]
    async fn test_threats_found_carries_threat_name() {
        let dir = tempdir().unwrap();
        let source = source_with_sidecar(
            dir.path(),
            "uploads/REF23456/file.pdf",
            Some(r#"{"status": "THREATS_FOUND", "threat_name": "EICAR-Test-File"}"#),
        )
        .await;

        let verdict = source
            .fetch_verdict("uploads/REF23456/file.pdf")
            .await
            .unwrap();
        assert_eq!(
            verdict,
            Some(ScanVerdict::ThreatsFound("EICAR-Test-File".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_status_is_failed() {
        let dir = tempdir().unwrap();
        let source = source_with_sidecar(
            dir.path(),
            "uploads/REF23456/file.pdf",
            Some(r#"{"status": "ACCESS_DENIED"}"#),
        )
        .await;

        let verdict = source
            .fetch_verdict("uploads/REF23456/file.pdf")
            .await
            .unwrap();
        assert!(matches!(verdict, Some(ScanVerdict::Failed(_))));
    }

    #[tokio::test]
    async fn test_malformed_sidecar_is_an_error() {
        let dir = tempdir().unwrap();
        let source =
            source_with_sidecar(dir.path(), "uploads/REF23456/file.pdf", Some("not json")).await;

        let result = source.fetch_verdict("uploads/REF23456/file.pdf").await;
        assert!(matches!(
            result,
            Err(ScanError::MalformedVerdict { .. })
        ));
    }
}

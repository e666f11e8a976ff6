//! Scan-verdict validation for file answers.
//!
//! A file answer is only valid for submission once its stored object has a
//! terminal scan verdict. Validation here is a pure check: it returns the
//! field-level error, if any, and never mutates shared state.

use formgate_scan::{ScanPoller, ScanVerdict};
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Error code attached to a rejected file answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCode {
    /// The scanner found a threat in the uploaded file.
    ContainsVirus,
    /// No verdict could be obtained; the upload cannot be accepted.
    ScanFailure,
}

impl ValidationCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationCode::ContainsVirus => "contains_virus",
            ValidationCode::ScanFailure => "scan_failure",
        }
    }
}

impl Display for ValidationCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Field-level validation error shown to the end user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerValidationError {
    /// Name of the form field the rejected upload belongs to.
    pub field: String,
    pub code: ValidationCode,
}

/// Validates file answers against their scan verdicts.
pub struct FileAnswerValidator {
    poller: ScanPoller,
}

impl FileAnswerValidator {
    pub fn new(poller: ScanPoller) -> Self {
        Self { poller }
    }

    /// Check the scan verdict for a stored upload.
    ///
    /// Returns `None` when the file is clean. A positive threat verdict maps
    /// to `contains_virus`; everything else that prevents a verdict (poll
    /// timeout, storage failure, a key that was never stored, a scanner that
    /// could not scan) maps to `scan_failure` with one diagnostic log entry
    /// tagged with the key. Runs off the request path: polling can suspend
    /// for the full scan wait budget.
    pub async fn validate(&self, field: &str, key: &str) -> Option<AnswerValidationError> {
        let failure_reason = match self.poller.poll_for_verdict(key).await {
            Ok(ScanVerdict::Clean) => return None,
            Ok(ScanVerdict::ThreatsFound(threat)) => {
                tracing::warn!(
                    key = %key,
                    field = %field,
                    threat = %threat,
                    "Uploaded file failed malware scan"
                );
                return Some(AnswerValidationError {
                    field: field.to_string(),
                    code: ValidationCode::ContainsVirus,
                });
            }
            Ok(ScanVerdict::Failed(reason)) => reason,
            Err(e) => e.to_string(),
        };

        tracing::error!(
            key = %key,
            field = %field,
            error = %failure_reason,
            "Could not obtain scan verdict for uploaded file"
        );

        Some(AnswerValidationError {
            field: field.to_string(),
            code: ValidationCode::ScanFailure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use formgate_core::ScanSourceKind;
    use formgate_scan::{
        ScanError, ScanPollerConfig, ScanResult, SidecarVerdictSource, VerdictSource,
    };
    use formgate_storage::LocalStorage;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::tempdir;
    use tracing::field::{Field, Visit};
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context as LayerContext, Layer, SubscriberExt};

    struct SequenceSource {
        responses: Mutex<Vec<ScanResult<Option<ScanVerdict>>>>,
    }

    impl SequenceSource {
        fn new(responses: Vec<ScanResult<Option<ScanVerdict>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    #[async_trait]
    impl VerdictSource for SequenceSource {
        async fn fetch_verdict(&self, _key: &str) -> ScanResult<Option<ScanVerdict>> {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(None)
            } else {
                responses.remove(0)
            }
        }

        fn source_kind(&self) -> ScanSourceKind {
            ScanSourceKind::Sidecar
        }
    }

    fn fast_config() -> ScanPollerConfig {
        ScanPollerConfig {
            max_wait: Duration::from_millis(50),
            poll_interval: Duration::from_millis(5),
        }
    }

    fn validator(responses: Vec<ScanResult<Option<ScanVerdict>>>) -> FileAnswerValidator {
        FileAnswerValidator::new(ScanPoller::new(SequenceSource::new(responses), fast_config()))
    }

    /// Layer capturing the `key` field of every error-level event.
    #[derive(Clone, Default)]
    struct ErrorLogCapture {
        keys: Arc<Mutex<Vec<String>>>,
    }

    #[derive(Default)]
    struct KeyVisitor {
        key: Option<String>,
    }

    impl Visit for KeyVisitor {
        fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
            if field.name() == "key" {
                self.key = Some(format!("{:?}", value));
            }
        }
    }

    impl<S: Subscriber> Layer<S> for ErrorLogCapture {
        fn on_event(&self, event: &Event<'_>, _ctx: LayerContext<'_, S>) {
            if *event.metadata().level() == Level::ERROR {
                let mut visitor = KeyVisitor::default();
                event.record(&mut visitor);
                self.keys
                    .lock()
                    .unwrap()
                    .push(visitor.key.unwrap_or_default());
            }
        }
    }

    #[tokio::test]
    async fn test_clean_verdict_passes() {
        let validator = validator(vec![Ok(Some(ScanVerdict::Clean))]);
        let error = validator.validate("evidence", "uploads/REF23456/a.pdf").await;
        assert_eq!(error, None);
    }

    #[tokio::test]
    async fn test_threats_found_is_contains_virus() {
        let validator = validator(vec![Ok(Some(ScanVerdict::ThreatsFound(
            "EICAR-Test-File".to_string(),
        )))]);

        let error = validator
            .validate("evidence", "uploads/REF23456/a.pdf")
            .await
            .unwrap();
        assert_eq!(error.field, "evidence");
        assert_eq!(error.code, ValidationCode::ContainsVirus);
        assert_eq!(error.code.as_str(), "contains_virus");
    }

    #[tokio::test]
    async fn test_verdict_after_pending_polls_passes() {
        let validator = validator(vec![Ok(None), Ok(None), Ok(Some(ScanVerdict::Clean))]);
        let error = validator.validate("evidence", "uploads/REF23456/a.pdf").await;
        assert_eq!(error, None);
    }

    #[tokio::test]
    async fn test_poll_timeout_is_scan_failure() {
        let validator = validator(vec![]);
        let error = validator
            .validate("evidence", "uploads/REF23456/a.pdf")
            .await
            .unwrap();
        assert_eq!(error.code, ValidationCode::ScanFailure);
        assert_eq!(error.code.as_str(), "scan_failure");
    }

    #[tokio::test]
    async fn test_failed_verdict_is_scan_failure() {
        let validator = validator(vec![Ok(Some(ScanVerdict::Failed(
            "scanner reported status ACCESS_DENIED".to_string(),
        )))]);
        let error = validator
            .validate("evidence", "uploads/REF23456/a.pdf")
            .await
            .unwrap();
        assert_eq!(error.code, ValidationCode::ScanFailure);
    }

    #[tokio::test]
    async fn test_source_error_is_scan_failure() {
        let validator = validator(vec![Err(ScanError::Scanner(
            "connection refused".to_string(),
        ))]);
        let error = validator
            .validate("evidence", "uploads/REF23456/a.pdf")
            .await
            .unwrap();
        assert_eq!(error.code, ValidationCode::ScanFailure);
    }

    #[tokio::test]
    async fn test_never_stored_key_is_scan_failure() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let poller = ScanPoller::new(Arc::new(SidecarVerdictSource::new(storage)), fast_config());
        let validator = FileAnswerValidator::new(poller);

        let error = validator
            .validate("evidence", "uploads/REF23456/never-uploaded.pdf")
            .await
            .unwrap();
        assert_eq!(error.code, ValidationCode::ScanFailure);
    }

    #[tokio::test]
    async fn test_scan_failure_logs_exactly_once_with_key() {
        let capture = ErrorLogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let validator = validator(vec![]);
        let error = validator
            .validate("evidence", "uploads/REF23456/a.pdf")
            .await
            .unwrap();
        assert_eq!(error.code, ValidationCode::ScanFailure);

        let keys = capture.keys.lock().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0], "uploads/REF23456/a.pdf");
    }

    #[tokio::test]
    async fn test_clean_verdict_logs_no_errors() {
        let capture = ErrorLogCapture::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let validator = validator(vec![Ok(Some(ScanVerdict::Clean))]);
        let error = validator.validate("evidence", "uploads/REF23456/a.pdf").await;
        assert_eq!(error, None);

        assert!(capture.keys.lock().unwrap().is_empty());
    }
}

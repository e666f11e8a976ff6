use crate::traits::{ScanError, ScanResult, VerdictSource};
use crate::ScanVerdict;
use formgate_core::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Polling parameters for waiting on a scan verdict.
#[derive(Debug, Clone, Copy)]
pub struct ScanPollerConfig {
    /// Longest total time to wait for a verdict before giving up.
    pub max_wait: Duration,
    /// Delay between consecutive verdict fetches.
    pub poll_interval: Duration,
}

impl Default for ScanPollerConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl ScanPollerConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_wait: Duration::from_secs(config.scan_max_wait_seconds()),
            poll_interval: Duration::from_millis(config.scan_poll_interval_ms()),
        }
    }
}

/// Polls a verdict source until a terminal verdict arrives or the wait budget
/// is exhausted.
pub struct ScanPoller {
    source: Arc<dyn VerdictSource>,
    config: ScanPollerConfig,
}

impl ScanPoller {
    pub fn new(source: Arc<dyn VerdictSource>, config: ScanPollerConfig) -> Self {
        Self { source, config }
    }

    /// Wait for the scan verdict for `key`.
    ///
    /// Fetches immediately, then retries every `poll_interval` until a verdict
    /// arrives or `max_wait` has elapsed. Exhausting the budget is reported as
    /// `ScanError::PollTimeout`, which is not a verdict about the file.
    pub async fn poll_for_verdict(&self, key: &str) -> ScanResult<ScanVerdict> {
        let started = Instant::now();

        loop {
            if let Some(verdict) = self.source.fetch_verdict(key).await? {
                tracing::debug!(
                    key = %key,
                    waited_ms = started.elapsed().as_millis() as u64,
                    verdict = ?verdict,
                    "Scan verdict available"
                );
                return Ok(verdict);
            }

            if started.elapsed() >= self.config.max_wait {
                return Err(ScanError::PollTimeout {
                    key: key.to_string(),
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use formgate_core::ScanSourceKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Verdict source that replays a scripted list of responses, then keeps
    /// reporting a pending scan.
    struct SequenceSource {
        responses: Mutex<Vec<ScanResult<Option<ScanVerdict>>>>,
        fetches: AtomicUsize,
    }

    impl SequenceSource {
        fn new(responses: Vec<ScanResult<Option<ScanVerdict>>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                fetches: AtomicUsize::new(0),
            })
        }

        fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VerdictSource for SequenceSource {
        async fn fetch_verdict(&self, _key: &str) -> ScanResult<Option<ScanVerdict>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
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
            max_wait: Duration::from_millis(100),
            poll_interval: Duration::from_millis(5),
        }
    }

    #[tokio::test]
    async fn test_verdict_on_first_fetch() {
        let source = SequenceSource::new(vec![Ok(Some(ScanVerdict::Clean))]);
        let poller = ScanPoller::new(source.clone(), fast_config());

        let verdict = poller.poll_for_verdict("uploads/REF23456/a.pdf").await.unwrap();
        assert_eq!(verdict, ScanVerdict::Clean);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_verdict_after_pending_fetches() {
        let source = SequenceSource::new(vec![
            Ok(None),
            Ok(None),
            Ok(Some(ScanVerdict::Clean)),
        ]);
        let poller = ScanPoller::new(source.clone(), fast_config());

        let verdict = poller.poll_for_verdict("uploads/REF23456/a.pdf").await.unwrap();
        assert_eq!(verdict, ScanVerdict::Clean);
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test]
    async fn test_timeout_when_verdict_never_arrives() {
        let source = SequenceSource::new(vec![]);
        let poller = ScanPoller::new(source, fast_config());

        let result = poller.poll_for_verdict("uploads/REF23456/a.pdf").await;
        match result {
            Err(ScanError::PollTimeout { key, waited_ms }) => {
                assert_eq!(key, "uploads/REF23456/a.pdf");
                assert!(waited_ms >= 100);
            }
            other => panic!("expected PollTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_threats_found_is_a_verdict_not_an_error() {
        let source = SequenceSource::new(vec![Ok(Some(ScanVerdict::ThreatsFound(
            "EICAR-Test-File".to_string(),
        )))]);
        let poller = ScanPoller::new(source, fast_config());

        let verdict = poller.poll_for_verdict("uploads/REF23456/a.pdf").await.unwrap();
        assert_eq!(verdict, ScanVerdict::ThreatsFound("EICAR-Test-File".to_string()));
    }

    #[tokio::test]
    async fn test_source_error_stops_polling() {
        let source = SequenceSource::new(vec![
            Err(ScanError::Scanner("connection refused".to_string())),
            Ok(Some(ScanVerdict::Clean)),
        ]);
        let poller = ScanPoller::new(source.clone(), fast_config());

        let result = poller.poll_for_verdict("uploads/REF23456/a.pdf").await;
        assert!(matches!(result, Err(ScanError::Scanner(_))));
        assert_eq!(source.fetch_count(), 1);
    }
}

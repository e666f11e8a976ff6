#[cfg(feature = "clamav")]
use crate::ClamAvVerdictSource;
use crate::{ScanResult, SidecarVerdictSource, VerdictSource};
#[cfg(not(feature = "clamav"))]
use crate::ScanError;
use formgate_core::{Config, ScanSourceKind};
use formgate_storage::Storage;
use std::sync::Arc;

/// Create a verdict source based on configuration
pub fn create_verdict_source(
    config: &Config,
    storage: Arc<dyn Storage>,
) -> ScanResult<Arc<dyn VerdictSource>> {
    let kind = config.scan_source().unwrap_or(ScanSourceKind::Sidecar);

    match kind {
        ScanSourceKind::Sidecar => Ok(Arc::new(SidecarVerdictSource::new(storage))),

        #[cfg(feature = "clamav")]
        ScanSourceKind::Clamav => Ok(Arc::new(ClamAvVerdictSource::with_timeout(
            storage,
            config.clamav_host().to_string(),
            config.clamav_port(),
            config.clamav_timeout_secs(),
        ))),

        #[cfg(not(feature = "clamav"))]
        ScanSourceKind::Clamav => Err(ScanError::ConfigError(
            "ClamAV verdict source not available (clamav feature not enabled)".to_string(),
        )),
    }
}

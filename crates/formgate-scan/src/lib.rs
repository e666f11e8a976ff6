//! Formgate Scan Library
//!
//! Malware scan verdicts for stored uploads. Provides the VerdictSource trait,
//! sources backed by scanner-written sidecar objects or a ClamAV daemon, and a
//! poller that waits for a terminal verdict within a bounded time budget.

#[cfg(feature = "clamav")]
pub mod clamav;
pub mod factory;
pub mod poller;
pub mod sidecar;
pub mod traits;
pub mod verdict;

// Re-export commonly used types
#[cfg(feature = "clamav")]
pub use clamav::ClamAvVerdictSource;
pub use factory::create_verdict_source;
pub use formgate_core::ScanSourceKind;
pub use poller::{ScanPoller, ScanPollerConfig};
pub use sidecar::{SidecarVerdictSource, SCAN_RESULTS_PREFIX};
pub use traits::{ScanError, ScanResult, VerdictSource};
pub use verdict::ScanVerdict;

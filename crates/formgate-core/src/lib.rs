//! Formgate Core Library
//!
//! This crate provides the domain models, error types, and configuration
//! shared across all Formgate components: form snapshots and modes,
//! submission payloads, job error classification, and telemetry init.

pub mod backends;
pub mod config;
pub mod job_error;
pub mod models;
pub mod telemetry;

// Re-export commonly used types
pub use backends::{NotifyBackend, ScanSourceKind, StorageBackend};
pub use config::{BaseConfig, Config, RunnerConfig};
pub use job_error::{JobError, JobResultExt};

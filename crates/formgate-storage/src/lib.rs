//! Formgate Storage Library
//!
//! Object storage gateway for uploaded files. Provides the Storage trait and
//! implementations for S3 and the local filesystem.
//!
//! # Storage key format
//!
//! Uploaded files live under `uploads/{submission_reference}/{uuid}.{ext}`.
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so callers and backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use formgate_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};

//! Formgate Services Layer
//!
//! This crate is the **business service layer**: it hosts the upload pipeline
//! (validate, store, answer-level scan verdicts), the forms API client, and
//! notification dispatch, and re-exports a unified API from the storage and
//! scan crates so that the worker depends on a single service facade. Keep
//! orchestration here; keep queueing and job execution in formgate-worker.

pub mod forms;
pub mod notify;
pub mod upload;

pub use formgate_scan::{
    create_verdict_source, ScanError, ScanPoller, ScanPollerConfig, ScanVerdict, VerdictSource,
};
pub use formgate_storage::{
    create_storage, Storage, StorageBackend, StorageError, StorageResult,
};
pub use forms::{FormsApiClient, FormsApiError, SnapshotSource};
pub use notify::{create_dispatch, DeliveryReceipt, NotificationDispatch, NotifyError};
pub use upload::{
    AnswerValidationError, FileAnswerValidator, StoredFile, UploadService, UploadValidationError,
    UploadValidator, ValidationCode,
};

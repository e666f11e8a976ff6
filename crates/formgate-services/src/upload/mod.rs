//! Upload handling: validate → store, and scan-verdict answer validation.

pub mod answer;
pub mod pipeline;
pub mod validator;

pub use answer::{AnswerValidationError, FileAnswerValidator, ValidationCode};
pub use pipeline::{StoredFile, UploadService};
pub use validator::{UploadValidationError, UploadValidator};

pub mod form;
pub mod reference;
pub mod submission;

pub use form::{FormMode, FormSnapshot, FormStep};
pub use reference::SubmissionReference;
pub use submission::{AnsweredQuestion, MailerOptions, SubmissionContext, SubmissionJobPayload};

//! Rendering of submission notifications, shared by all dispatch backends.

use formgate_core::models::{MailerOptions, SubmissionContext};
use serde_json::{json, Map, Value};

/// Subject line for the notification email.
///
/// Preview submissions are marked so recipients never mistake a test for a
/// real submission.
pub fn subject(options: &MailerOptions) -> String {
    if options.is_preview {
        format!(
            "TEST FORM SUBMISSION: {} - reference: {}",
            options.title, options.submission_reference
        )
    } else {
        format!(
            "Form submission: {} - reference: {}",
            options.title, options.submission_reference
        )
    }
}

/// Question and answer pairs rendered as plain text blocks.
pub fn answer_rows(context: &SubmissionContext) -> String {
    let mut out = String::new();
    for qa in &context.answers {
        out.push_str("## ");
        out.push_str(&qa.question);
        out.push_str("\n\n");
        out.push_str(&qa.answer);
        out.push_str("\n\n");
    }
    out
}

/// Personalisation map for template-based providers.
pub fn personalisation(context: &SubmissionContext, options: &MailerOptions) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("title".to_string(), json!(options.title));
    map.insert("text_input".to_string(), json!(answer_rows(context)));
    map.insert("submission_time".to_string(), json!(options.timestamp));
    map.insert(
        "submission_reference".to_string(),
        json!(options.submission_reference),
    );
    map.insert(
        "test".to_string(),
        json!(if options.is_preview { "yes" } else { "no" }),
    );
    map.insert(
        "include_payment_link".to_string(),
        json!(options.payment_link.is_some()),
    );
    map.insert(
        "payment_link".to_string(),
        json!(options.payment_link.clone().unwrap_or_default()),
    );
    map
}

/// Plain-text body for SMTP delivery.
pub fn plain_body(context: &SubmissionContext, options: &MailerOptions) -> String {
    let mut body = format!(
        "{}\n\nSubmitted: {}\nReference: {}\n\n{}",
        options.title,
        options.timestamp,
        options.submission_reference,
        answer_rows(context)
    );
    if let Some(payment_link) = &options.payment_link {
        body.push_str(&format!("Pay for this submission: {}\n", payment_link));
    }
    body
}

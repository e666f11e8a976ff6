use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::form::FormSnapshot;

/// Serialized snapshot of a completed form session, enqueued for dispatch.
///
/// Only strings, numbers, and JSON values cross the queue boundary; the full
/// form structure is re-fetched and the session reconstructed when the job
/// runs. Immutable once enqueued, consumed exactly once per job execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionJobPayload {
    pub form_id: i64,
    /// Form mode as a string (`live`, `preview-draft`, ...); resolved to a
    /// [`FormMode`](super::FormMode) when the job runs.
    pub mode: String,
    /// RFC 3339 completion timestamp captured when the user submitted.
    pub timestamp: String,
    pub submission_reference: String,
    /// Provider-side reference for the notification email, used for
    /// correlation and duplicate suppression.
    pub email_reference: String,
    /// Answers keyed by question step id.
    pub answers: BTreeMap<String, serde_json::Value>,
}

/// A completed form reconstructed from a snapshot and the answer mapping,
/// ready to be rendered into a notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionContext {
    pub form_id: i64,
    pub form_title: String,
    pub submission_email: Option<String>,
    pub answers: Vec<AnsweredQuestion>,
}

/// One (question, answer) pair in snapshot step order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
    pub answered: bool,
}

impl SubmissionContext {
    /// Reconstruct the completed form from the snapshot and the serialized
    /// answer mapping. Questions keep snapshot step order; steps with no
    /// recorded answer render as not answered.
    pub fn from_snapshot(
        snapshot: &FormSnapshot,
        answers: &BTreeMap<String, serde_json::Value>,
    ) -> Self {
        let answers = snapshot
            .steps
            .iter()
            .map(|step| match answers.get(&step.id.to_string()) {
                Some(value) => AnsweredQuestion {
                    question: step.question_text.clone(),
                    answer: render_answer(value),
                    answered: true,
                },
                None => AnsweredQuestion {
                    question: step.question_text.clone(),
                    answer: "Not answered".to_string(),
                    answered: false,
                },
            })
            .collect();

        Self {
            form_id: snapshot.form_id,
            form_title: snapshot.name.clone(),
            submission_email: snapshot.submission_email.clone(),
            answers,
        }
    }
}

/// Render a serialized answer value as display text.
///
/// Strings pass through; arrays (multi-select answers) join with commas;
/// anything else falls back to its JSON rendering.
fn render_answer(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(items) => items
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Options handed to notification dispatch alongside the reconstructed form.
///
/// Built by the dispatch job after the snapshot has been fetched; carries
/// everything the notification template needs beyond the answers themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerOptions {
    pub title: String,
    pub is_preview: bool,
    /// Completion time already formatted in the configured timezone.
    pub timestamp: String,
    pub submission_reference: String,
    /// Payment URL with the submission reference interpolated, when the form
    /// takes payments.
    pub payment_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form::FormStep;

    fn snapshot() -> FormSnapshot {
        FormSnapshot {
            form_id: 3,
            name: "Register a boiler".to_string(),
            submission_email: Some("boilers@example.gov.uk".to_string()),
            payment_url: None,
            steps: vec![
                FormStep {
                    id: 1,
                    question_text: "What is your full name?".to_string(),
                    is_optional: false,
                },
                FormStep {
                    id: 2,
                    question_text: "Which fuels does it burn?".to_string(),
                    is_optional: false,
                },
                FormStep {
                    id: 3,
                    question_text: "Anything else to tell us?".to_string(),
                    is_optional: true,
                },
            ],
        }
    }

    #[test]
    fn context_follows_step_order() {
        let mut answers = BTreeMap::new();
        answers.insert("2".to_string(), serde_json::json!(["Gas", "Oil"]));
        answers.insert("1".to_string(), serde_json::json!("Ada Lovelace"));

        let context = SubmissionContext::from_snapshot(&snapshot(), &answers);

        assert_eq!(context.form_title, "Register a boiler");
        assert_eq!(context.answers.len(), 3);
        assert_eq!(context.answers[0].answer, "Ada Lovelace");
        assert_eq!(context.answers[1].answer, "Gas, Oil");
        assert!(!context.answers[2].answered);
        assert_eq!(context.answers[2].answer, "Not answered");
    }

    #[test]
    fn numeric_answers_render_as_text() {
        let mut answers = BTreeMap::new();
        answers.insert("1".to_string(), serde_json::json!(42));
        let context = SubmissionContext::from_snapshot(&snapshot(), &answers);
        assert_eq!(context.answers[0].answer, "42");
    }

    #[test]
    fn payload_round_trips_through_json() {
        let mut answers = BTreeMap::new();
        answers.insert("1".to_string(), serde_json::json!("yes"));
        let payload = SubmissionJobPayload {
            form_id: 9,
            mode: "preview-draft".to_string(),
            timestamp: "2026-03-05T14:45:00Z".to_string(),
            submission_reference: "ABCD2345".to_string(),
            email_reference: "ABCD2345-submission".to_string(),
            answers,
        };
        let value = serde_json::to_value(&payload).unwrap();
        let back: SubmissionJobPayload = serde_json::from_value(value).unwrap();
        assert_eq!(back.form_id, 9);
        assert_eq!(back.mode, "preview-draft");
        assert_eq!(back.answers["1"], serde_json::json!("yes"));
    }
}

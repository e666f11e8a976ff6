use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Form lifecycle mode.
///
/// The mode travels through job payloads as a plain string and selects which
/// snapshot of a form is fetched. Preview modes render submissions marked as
/// previews; they never reach real recipients in the live sense.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FormMode {
    Live,
    PreviewDraft,
    PreviewArchived,
    PreviewLive,
}

impl FormMode {
    /// Whether submissions in this mode are previews rather than real ones.
    pub fn is_preview(&self) -> bool {
        !matches!(self, FormMode::Live)
    }

    /// Path segment used when fetching the form snapshot for this mode.
    pub fn api_segment(&self) -> &'static str {
        match self {
            FormMode::Live | FormMode::PreviewLive => "live",
            FormMode::PreviewDraft => "draft",
            FormMode::PreviewArchived => "archived",
        }
    }
}

impl Display for FormMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FormMode::Live => write!(f, "live"),
            FormMode::PreviewDraft => write!(f, "preview-draft"),
            FormMode::PreviewArchived => write!(f, "preview-archived"),
            FormMode::PreviewLive => write!(f, "preview-live"),
        }
    }
}

impl FromStr for FormMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "live" => Ok(FormMode::Live),
            // Legacy payloads carry a bare "preview" for draft previews.
            "preview" | "preview-draft" => Ok(FormMode::PreviewDraft),
            "preview-archived" => Ok(FormMode::PreviewArchived),
            "preview-live" => Ok(FormMode::PreviewLive),
            _ => Err(anyhow::anyhow!("Invalid form mode: {}", s)),
        }
    }
}

/// Read-only snapshot of a form's structure, fetched from the forms API by
/// (form id, mode). Owned by a dispatch job for the duration of one execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub form_id: i64,
    pub name: String,
    /// Address the completed submission is delivered to.
    pub submission_email: Option<String>,
    /// Payment URL template; the submission reference is appended when building
    /// mailer options.
    pub payment_url: Option<String>,
    pub steps: Vec<FormStep>,
}

/// One question step of a form snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormStep {
    pub id: i64,
    pub question_text: String,
    #[serde(default)]
    pub is_optional: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips() {
        for mode in [
            FormMode::Live,
            FormMode::PreviewDraft,
            FormMode::PreviewArchived,
            FormMode::PreviewLive,
        ] {
            assert_eq!(mode.to_string().parse::<FormMode>().unwrap(), mode);
        }
    }

    #[test]
    fn unknown_mode_rejected() {
        assert!("published".parse::<FormMode>().is_err());
        assert!("".parse::<FormMode>().is_err());
    }

    #[test]
    fn legacy_preview_alias_parses_as_draft() {
        assert_eq!("preview".parse::<FormMode>().unwrap(), FormMode::PreviewDraft);
    }

    #[test]
    fn preview_modes_flagged() {
        assert!(!FormMode::Live.is_preview());
        assert!(FormMode::PreviewDraft.is_preview());
        assert!(FormMode::PreviewArchived.is_preview());
        assert!(FormMode::PreviewLive.is_preview());
    }

    #[test]
    fn api_segment_per_mode() {
        assert_eq!(FormMode::Live.api_segment(), "live");
        assert_eq!(FormMode::PreviewLive.api_segment(), "live");
        assert_eq!(FormMode::PreviewDraft.api_segment(), "draft");
        assert_eq!(FormMode::PreviewArchived.api_segment(), "archived");
    }

    #[test]
    fn snapshot_deserializes_with_optional_fields() {
        let json = serde_json::json!({
            "form_id": 7,
            "name": "Apply for a licence",
            "submission_email": "processing@example.gov.uk",
            "payment_url": null,
            "steps": [
                {"id": 1, "question_text": "What is your name?"},
                {"id": 2, "question_text": "Upload your evidence", "is_optional": true}
            ]
        });
        let snapshot: FormSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(snapshot.form_id, 7);
        assert!(snapshot.payment_url.is_none());
        assert!(!snapshot.steps[0].is_optional);
        assert!(snapshot.steps[1].is_optional);
    }
}

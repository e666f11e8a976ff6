//! Submission reference generation.
//!
//! References correlate a submission with its notification and payment
//! records, and are read back to users over the phone. The character set
//! drops easily-confused glyphs (I, O, 0, 1).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

const REFERENCE_LEN: usize = 8;
const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Unique reference for one form submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionReference(String);

impl SubmissionReference {
    /// Generate a fresh random reference.
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let reference: String = (0..REFERENCE_LEN)
            .map(|_| REFERENCE_CHARSET[rng.random_range(0..REFERENCE_CHARSET.len())] as char)
            .collect();
        Self(reference)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for SubmissionReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl From<SubmissionReference> for String {
    fn from(reference: SubmissionReference) -> Self {
        reference.0
    }
}

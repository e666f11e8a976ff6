use serde::{Deserialize, Serialize};

/// Terminal outcome of a malware scan.
///
/// A pending scan is represented by absence (`Option::None` from a
/// `VerdictSource`), never by a variant here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanVerdict {
    /// No threats were found in the object.
    Clean,
    /// The scanner identified a threat; carries the threat name when known.
    ThreatsFound(String),
    /// The scanner ran but could not produce a clean/infected answer
    /// (unsupported file, access denied, internal scanner error).
    Failed(String),
}

impl ScanVerdict {
    pub fn is_clean(&self) -> bool {
        matches!(self, ScanVerdict::Clean)
    }
}

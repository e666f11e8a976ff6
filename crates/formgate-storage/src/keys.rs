//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{submission_reference}/{uuid}.{extension}`.

use uuid::Uuid;

/// Generate a storage key for an uploaded file answer.
///
/// Keys group uploads by submission reference and use a fresh UUID for the
/// object name so repeated uploads of the same filename never collide. All
/// backends must use this format for consistency.
pub fn generate_upload_key(submission_reference: &str, extension: &str) -> String {
    format!(
        "uploads/{}/{}.{}",
        submission_reference,
        Uuid::new_v4(),
        extension.trim_start_matches('.').to_lowercase()
    )
}

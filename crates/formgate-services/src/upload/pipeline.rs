//! Upload pipeline: validate → store.
//!
//! This module provides the canonical validate→store flow for file answers.
//! Validation is delegated to [`UploadValidator`](crate::UploadValidator) so
//! all validation rules (including extension/content-type matching) live in
//! one place. Scan verdicts are checked later, against the stored key, by the
//! answer validation in [`answer`](super::answer).

use anyhow::{Context, Result};
use std::sync::Arc;

use formgate_storage::{keys, Storage};

use super::validator::UploadValidator;

/// Record of a stored upload, kept in session data until submission.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct StoredFile {
    /// Storage key the object lives under.
    pub key: String,
    pub safe_original_filename: String,
    pub content_type: String,
    pub file_size: i64,
}

fn sanitize_filename(filename: &str) -> String {
    const MAX: usize = 255;
    let path = std::path::Path::new(filename);
    let base = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    if base.contains("..") {
        return "invalid_filename".to_string();
    }
    let s: String = base
        .chars()
        .take(MAX)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.trim().is_empty() || s.len() < 3 {
        "file".to_string()
    } else {
        s
    }
}

/// Stores validated uploads under submission-scoped keys.
pub struct UploadService {
    storage: Arc<dyn Storage>,
    validator: UploadValidator,
}

impl UploadService {
    pub fn new(storage: Arc<dyn Storage>, validator: UploadValidator) -> Self {
        Self { storage, validator }
    }

    /// Run the upload pipeline: validate → store.
    ///
    /// The stored key carries the submission reference so every object can be
    /// traced back to its submission.
    pub async fn store(
        &self,
        submission_reference: &str,
        original_filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<StoredFile> {
        self.validator
            .validate_all(original_filename, content_type, data.len())
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Validation failed")?;

        let extension = original_filename
            .rsplit('.')
            .next()
            .unwrap_or("")
            .to_lowercase();

        let safe = sanitize_filename(original_filename);
        let key = keys::generate_upload_key(submission_reference, &extension);
        let file_size = data.len();

        self.storage
            .put(&key, data, content_type)
            .await
            .map_err(anyhow::Error::from)
            .context("Storage upload failed")?;

        Ok(StoredFile {
            key,
            safe_original_filename: safe,
            content_type: content_type.to_string(),
            file_size: file_size as i64,
        })
    }

    /// Remove a stored upload, e.g. when the user replaces or deletes an
    /// answer before submitting.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.storage
            .delete(key)
            .await
            .map_err(anyhow::Error::from)
            .context("Storage delete failed")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formgate_storage::LocalStorage;
    use tempfile::tempdir;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(
            1024 * 1024,
            vec!["txt".to_string(), "pdf".to_string()],
            vec!["text/plain".to_string(), "application/pdf".to_string()],
        )
    }

    async fn test_service(dir: &std::path::Path) -> UploadService {
        let storage = Arc::new(LocalStorage::new(dir).await.unwrap());
        UploadService::new(storage, test_validator())
    }

    #[tokio::test]
    async fn test_store_places_object_under_submission_key() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let stored = service
            .store("REF23456", "my notes.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();

        assert!(stored.key.starts_with("uploads/REF23456/"));
        assert!(stored.key.ends_with(".txt"));
        assert_eq!(stored.safe_original_filename, "my_notes.txt");
        assert_eq!(stored.file_size, 5);
    }

    #[tokio::test]
    async fn test_store_rejects_disallowed_extension() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let result = service
            .store("REF23456", "evil.exe", "application/x-dosexec", b"MZ".to_vec())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_store_rejects_mismatched_content_type() {
        let dir = tempdir().unwrap();
        let service = test_service(dir.path()).await;

        let result = service
            .store("REF23456", "notes.txt", "application/pdf", b"hello".to_vec())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_remove_deletes_object() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(LocalStorage::new(dir.path()).await.unwrap());
        let service = UploadService::new(storage.clone(), test_validator());

        let stored = service
            .store("REF23456", "notes.txt", "text/plain", b"hello".to_vec())
            .await
            .unwrap();
        assert!(storage.exists(&stored.key).await.unwrap());

        service.remove(&stored.key).await.unwrap();
        assert!(!storage.exists(&stored.key).await.unwrap());
    }
}

//! Job execution error types
//!
//! Errors surfaced by a submission job tell the queue whether retrying can
//! help. A form that does not exist will not appear on retry; a notification
//! provider outage usually clears. Jobs wrap their errors accordingly and the
//! queue inspects the flag before scheduling another attempt.

use std::fmt;

/// Job execution error that can be either recoverable or unrecoverable
#[derive(Debug)]
pub struct JobError {
    inner: anyhow::Error,
    recoverable: bool,
}

impl JobError {
    /// Create a new unrecoverable job error
    ///
    /// Unrecoverable errors fail the job immediately without retrying.
    /// Use this for errors like:
    /// - A form snapshot that does not exist for the requested mode
    /// - An unknown mode string or malformed payload field
    /// - Missing configuration (API keys, template ids)
    pub fn unrecoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: false,
        }
    }

    /// Create a new recoverable job error
    ///
    /// Recoverable errors are retried according to the queue's retry policy.
    /// Use this for errors like:
    /// - Notification provider rejections and timeouts
    /// - Transient network failures reaching the forms API
    pub fn recoverable(err: impl Into<anyhow::Error>) -> Self {
        Self {
            inner: err.into(),
            recoverable: true,
        }
    }

    /// Check if this error is recoverable (should be retried)
    pub fn is_recoverable(&self) -> bool {
        self.recoverable
    }

    /// Get the inner error
    pub fn inner(&self) -> &anyhow::Error {
        &self.inner
    }

    /// Consume self and return the inner error
    pub fn into_inner(self) -> anyhow::Error {
        self.inner
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl std::error::Error for JobError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

impl From<anyhow::Error> for JobError {
    /// Default conversion from anyhow::Error creates a recoverable error
    fn from(err: anyhow::Error) -> Self {
        Self::recoverable(err)
    }
}

// Note: From<JobError> for anyhow::Error comes from anyhow's blanket
// implementation for std::error::Error types.

/// Extension trait for Result to easily create unrecoverable job errors
pub trait JobResultExt<T> {
    /// Mark this result as unrecoverable on error
    fn unrecoverable(self) -> Result<T, JobError>;
}

impl<T, E: Into<anyhow::Error>> JobResultExt<T> for Result<T, E> {
    fn unrecoverable(self) -> Result<T, JobError> {
        self.map_err(|e| JobError::unrecoverable(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecoverable_error() {
        let err = JobError::unrecoverable(anyhow::anyhow!("Form 42 not found"));
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Form 42 not found"));
    }

    #[test]
    fn test_recoverable_error() {
        let err = JobError::recoverable(anyhow::anyhow!("Provider timeout"));
        assert!(err.is_recoverable());
        assert!(err.to_string().contains("Provider timeout"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: JobError = anyhow::anyhow!("Some error").into();
        assert!(err.is_recoverable(), "Default should be recoverable");
    }

    #[test]
    fn test_result_ext() {
        let result: Result<(), anyhow::Error> = Err(anyhow::anyhow!("Unknown mode"));
        let job_result = result.unrecoverable();
        assert!(job_result.is_err());
        assert!(!job_result.unwrap_err().is_recoverable());
    }
}

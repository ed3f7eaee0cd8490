use thiserror::Error;

/// Job-level errors surfaced as the single current error message.
///
/// Artifact fetch failures are deliberately absent: they degrade the
/// narrative or chart view instead of failing the job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("please select a PDF document")]
    MissingDocument,
    /// Transport or backend-reported failure at submit time.
    #[error("submission failed: {0}")]
    Submission(String),
    /// Transport failure while polling; the job may still be running remotely.
    #[error("status-check failed: {0}")]
    StatusCheck(String),
    /// The backend reported a terminal status other than `completed`.
    #[error("{0}")]
    JobFailure(String),
    /// The artifact names for a completed job could not be obtained.
    #[error("results error: {0}")]
    ResultsMetadata(String),
}

use crate::{BackendStatus, DocumentRef, JobId, SessionId};

/// A narrative artifact that could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFailure {
    pub reason: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked the PDF to analyze.
    DocumentSelected(DocumentRef),
    /// User edited the page-count input (raw text).
    PageCountChanged(String),
    /// User submitted the form.
    SubmitClicked,
    /// Backend accepted the upload and assigned a job id.
    JobAccepted { session: SessionId, job_id: JobId },
    /// Upload failed, either in transport or with a backend error payload.
    SubmitFailed { session: SessionId, reason: String },
    /// One poll resolved with a backend status.
    StatusReported {
        session: SessionId,
        status: BackendStatus,
        /// Backend explanation accompanying the status, if any.
        detail: Option<String>,
    },
    /// One poll failed in transport.
    StatusCheckFailed { session: SessionId, reason: String },
    /// One message from the log stream.
    LogLine { session: SessionId, line: String },
    /// Progress timer fired.
    ProgressTick { session: SessionId },
    /// Both artifacts were attempted.
    ResultsAssembled {
        session: SessionId,
        narrative: Result<String, ArtifactFailure>,
        /// Chart download URL, or the reason it is unavailable.
        chart: Result<String, String>,
    },
    /// The results metadata fetch failed; no artifact was attempted.
    ResultsFailed { session: SessionId, reason: String },
    /// The owning session is being torn down (e.g. the app is closing).
    SessionClosed,
    /// Render tick.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}

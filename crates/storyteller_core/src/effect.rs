use crate::{DocumentRef, JobId, PageCount, SessionId};

/// Side effects requested by [`crate::update`]; executed by the platform layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Submit {
        session: SessionId,
        document: DocumentRef,
        page_count: PageCount,
    },
    StartProgressTimer { session: SessionId },
    StopProgressTimer { session: SessionId },
    OpenLogStream { session: SessionId, job_id: JobId },
    CloseLogStream { session: SessionId },
    StartPolling { session: SessionId, job_id: JobId },
    FetchResults { session: SessionId, job_id: JobId },
    /// Cancel every background task owned by the session.
    Teardown { session: SessionId },
}

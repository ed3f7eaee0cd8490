use std::fmt;

use bytes::Bytes;

/// Session id assigned by the state machine; every command and event carries it.
pub type SessionId = u64;

/// Status reported by the backend for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Unrecognized(String),
}

impl JobStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            other => JobStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Unrecognized(raw) => raw,
        }
    }

    /// Only `running` keeps the poller going.
    pub fn is_running(&self) -> bool {
        matches!(self, JobStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: JobStatus,
    pub detail: Option<String>,
}

/// Artifact names returned by `GET results/{jobId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultNames {
    pub narrative: String,
    pub sankey: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NarrativeOutcome {
    Loaded {
        name: String,
        text: String,
    },
    Failed {
        name: String,
        reason: String,
        download_url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Available {
        name: String,
        url: String,
        bytes: Bytes,
    },
    Unavailable {
        name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResults {
    pub narrative: NarrativeOutcome,
    pub chart: ChartOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    JobAccepted {
        session: SessionId,
        job_id: String,
    },
    SubmitFailed {
        session: SessionId,
        error: TransportError,
    },
    StatusReported {
        session: SessionId,
        report: StatusReport,
    },
    StatusCheckFailed {
        session: SessionId,
        error: TransportError,
    },
    LogLine {
        session: SessionId,
        line: String,
    },
    ProgressTick {
        session: SessionId,
    },
    ResultsAssembled {
        session: SessionId,
        job_id: String,
        results: AssembledResults,
    },
    ResultsFailed {
        session: SessionId,
        error: TransportError,
    },
}

impl EngineEvent {
    pub fn session(&self) -> SessionId {
        match self {
            EngineEvent::JobAccepted { session, .. }
            | EngineEvent::SubmitFailed { session, .. }
            | EngineEvent::StatusReported { session, .. }
            | EngineEvent::StatusCheckFailed { session, .. }
            | EngineEvent::LogLine { session, .. }
            | EngineEvent::ProgressTick { session }
            | EngineEvent::ResultsAssembled { session, .. }
            | EngineEvent::ResultsFailed { session, .. } => *session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            // The backend already phrased it for humans.
            FailureKind::Backend => f.write_str(&self.message),
            _ => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for TransportError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    /// Success status with an explicit `error` field in the payload.
    Backend,
    Decode,
    Io,
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Backend => write!(f, "backend error"),
            FailureKind::Decode => write!(f, "malformed response"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

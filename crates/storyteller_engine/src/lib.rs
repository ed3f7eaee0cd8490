//! Storyteller engine: backend transport and the background tasks of a monitored job.
mod decode;
mod engine;
mod export;
mod filename;
mod log_stream;
mod persist;
mod poller;
mod progress_timer;
mod results;
mod session;
mod sse;
mod transport;
mod types;

pub use decode::{decode_text, DecodeError, DecodedText};
pub use engine::{ChannelEventSink, EngineError, EngineHandle, EventSink, MonitorSettings};
pub use export::{export_artifacts, ExportError, ExportSummary};
pub use filename::artifact_filename;
pub use log_stream::LogStreamCoordinator;
pub use persist::{ArtifactDir, PersistError};
pub use poller::{poll_until_terminal, PollEnd};
pub use progress_timer::ProgressTimer;
pub use results::assemble_results;
pub use session::{MonitorSession, SessionContext};
pub use sse::SseDecoder;
pub use transport::{Backend, BackendSettings, LogLines, ReqwestBackend};
pub use types::{
    Artifact, AssembledResults, ChartOutcome, EngineEvent, FailureKind, JobStatus,
    NarrativeOutcome, ResultNames, SessionId, StatusReport, TransportError,
};

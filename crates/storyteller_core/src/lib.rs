//! Storyteller core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod error;
mod msg;
mod progress;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::JobError;
pub use msg::{ArtifactFailure, Msg};
pub use progress::{
    ProgressEstimator, TickOutcome, PROGRESS_CEILING, PROGRESS_COMPLETE, PROGRESS_SEED,
    PROGRESS_STEP,
};
pub use state::{
    AppState, BackendStatus, DocumentRef, JobId, JobPhase, LogBuffer, PageCount, SessionId,
};
pub use update::update;
pub use view_model::{
    ChartView, MonitorView, NarrativeView, LOGS_PLACEHOLDER, NARRATIVE_PLACEHOLDER,
};

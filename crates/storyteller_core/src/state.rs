use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};

use crate::view_model::{ChartView, MonitorView, NarrativeView};
use crate::{ArtifactFailure, Effect, JobError, ProgressEstimator, TickOutcome};

/// Client-assigned id of one monitoring session; 0 is never used.
pub type SessionId = u64;

/// Server-assigned, opaque job identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The PDF selected for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    path: PathBuf,
    name: String,
}

impl DocumentRef {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "document.pdf".to_string());
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

const DEFAULT_PAGES: NonZeroU32 = match NonZeroU32::new(3) {
    Some(pages) => pages,
    None => panic!("default page count must be non-zero"),
};

/// Upper bound on the number of pages the backend analyzes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCount(NonZeroU32);

impl PageCount {
    pub fn new(pages: u32) -> Option<Self> {
        NonZeroU32::new(pages).map(Self)
    }

    /// Parse user input; anything that is not a positive integer yields the default.
    pub fn parse_or_default(raw: &str) -> Self {
        raw.trim()
            .parse::<u32>()
            .ok()
            .and_then(Self::new)
            .unwrap_or_default()
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl Default for PageCount {
    fn default() -> Self {
        Self(DEFAULT_PAGES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobPhase {
    #[default]
    Idle,
    Uploading,
    Running,
    Completed,
    Failed,
}

impl JobPhase {
    /// Phases during which the poller, log stream and progress timer run.
    pub fn is_active(self) -> bool {
        matches!(self, JobPhase::Uploading | JobPhase::Running)
    }
}

/// Status string reported by `GET status/{jobId}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendStatus {
    Running,
    Completed,
    Failed,
    Unrecognized(String),
}

impl BackendStatus {
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "running" => BackendStatus::Running,
            "completed" => BackendStatus::Completed,
            "failed" => BackendStatus::Failed,
            other => BackendStatus::Unrecognized(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BackendStatus::Running => "running",
            BackendStatus::Completed => "completed",
            BackendStatus::Failed => "failed",
            BackendStatus::Unrecognized(raw) => raw,
        }
    }
}

/// Append-only log lines of one session.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Every line followed by a newline separator.
    pub fn render(&self) -> String {
        let capacity = self.lines.iter().map(|line| line.len() + 1).sum();
        let mut text = String::with_capacity(capacity);
        for line in &self.lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum ResultsState {
    #[default]
    NotRequested,
    Pending,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SubmitForm {
    document: Option<DocumentRef>,
    page_count: PageCount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Session {
    id: SessionId,
    document: DocumentRef,
    page_count: PageCount,
    job_id: Option<JobId>,
    phase: JobPhase,
    status: String,
    logs: LogBuffer,
    progress: ProgressEstimator,
    narrative: NarrativeView,
    chart: ChartView,
    results: ResultsState,
    error: Option<JobError>,
    closed: bool,
}

impl Session {
    fn start(id: SessionId, document: DocumentRef, page_count: PageCount) -> Self {
        let mut progress = ProgressEstimator::new();
        progress.start();
        Self {
            id,
            document,
            page_count,
            job_id: None,
            phase: JobPhase::Uploading,
            status: "Uploading...".to_string(),
            logs: LogBuffer::default(),
            progress,
            narrative: NarrativeView::NotLoaded,
            chart: ChartView::NotLoaded,
            results: ResultsState::NotRequested,
            error: None,
            closed: false,
        }
    }

    pub(crate) fn accept(&mut self, job_id: JobId) -> Vec<Effect> {
        if self.phase != JobPhase::Uploading || self.job_id.is_some() {
            return Vec::new();
        }
        self.job_id = Some(job_id.clone());
        vec![
            Effect::OpenLogStream {
                session: self.id,
                job_id: job_id.clone(),
            },
            Effect::StartPolling {
                session: self.id,
                job_id,
            },
        ]
    }

    pub(crate) fn submit_failed(&mut self, reason: String) -> Vec<Effect> {
        if self.phase != JobPhase::Uploading || self.job_id.is_some() {
            return Vec::new();
        }
        self.status = "Error".to_string();
        self.fail(JobError::Submission(reason))
    }

    pub(crate) fn status_reported(
        &mut self,
        status: BackendStatus,
        detail: Option<String>,
    ) -> Vec<Effect> {
        let Some(job_id) = self.job_id.clone() else {
            return Vec::new();
        };
        if !self.phase.is_active() {
            return Vec::new();
        }
        self.status = status.as_str().to_string();
        match &status {
            BackendStatus::Running => {
                self.phase = JobPhase::Running;
                Vec::new()
            }
            BackendStatus::Completed => {
                self.phase = JobPhase::Completed;
                self.progress.complete();
                self.results = ResultsState::Pending;
                let mut effects = self.stop_background();
                effects.push(Effect::FetchResults {
                    session: self.id,
                    job_id,
                });
                effects
            }
            // "failed" and unknown values share one terminal path; the
            // backend's detail, when given, is the message.
            BackendStatus::Failed | BackendStatus::Unrecognized(_) => {
                let message = detail
                    .filter(|detail| !detail.trim().is_empty())
                    .unwrap_or_else(|| status.as_str().to_string());
                self.fail(JobError::JobFailure(message))
            }
        }
    }

    pub(crate) fn status_check_failed(&mut self, reason: String) -> Vec<Effect> {
        if !self.phase.is_active() || self.job_id.is_none() {
            return Vec::new();
        }
        self.status = "Error".to_string();
        self.fail(JobError::StatusCheck(reason))
    }

    pub(crate) fn append_log(&mut self, line: String) {
        self.logs.push(line);
    }

    pub(crate) fn progress_tick(&mut self) -> Vec<Effect> {
        if !self.phase.is_active() {
            return Vec::new();
        }
        match self.progress.tick() {
            TickOutcome::ReachedCeiling => vec![Effect::StopProgressTimer { session: self.id }],
            TickOutcome::Advanced(_) | TickOutcome::Ignored => Vec::new(),
        }
    }

    pub(crate) fn results_assembled(
        &mut self,
        narrative: Result<String, ArtifactFailure>,
        chart: Result<String, String>,
    ) {
        if self.phase != JobPhase::Completed || self.results != ResultsState::Pending {
            return;
        }
        self.narrative = match narrative {
            Ok(text) => NarrativeView::Loaded(text),
            Err(ArtifactFailure {
                reason,
                download_url,
            }) => NarrativeView::Fallback {
                reason,
                download_url,
            },
        };
        self.chart = match chart {
            Ok(url) => ChartView::Available { url },
            Err(reason) => ChartView::Unavailable { reason },
        };
        self.results = ResultsState::Resolved;
    }

    pub(crate) fn results_failed(&mut self, reason: String) {
        if self.phase != JobPhase::Completed || self.results != ResultsState::Pending {
            return;
        }
        self.error = Some(JobError::ResultsMetadata(reason));
        self.results = ResultsState::Resolved;
    }

    fn fail(&mut self, error: JobError) -> Vec<Effect> {
        self.phase = JobPhase::Failed;
        self.progress.freeze();
        self.error = Some(error);
        self.stop_background()
    }

    fn stop_background(&self) -> Vec<Effect> {
        vec![
            Effect::CloseLogStream { session: self.id },
            Effect::StopProgressTimer { session: self.id },
        ]
    }

    fn is_settled(&self) -> bool {
        match self.phase {
            JobPhase::Failed => true,
            JobPhase::Completed => self.results == ResultsState::Resolved,
            JobPhase::Idle | JobPhase::Uploading | JobPhase::Running => self.closed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    form: SubmitForm,
    form_error: Option<JobError>,
    last_session: SessionId,
    session: Option<Session>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> MonitorView {
        let Some(session) = &self.session else {
            return MonitorView {
                page_count: self.form.page_count,
                document: self.form.document.as_ref().map(|doc| doc.name().to_string()),
                error: self.form_error.clone(),
                dirty: self.dirty,
                ..MonitorView::default()
            };
        };
        MonitorView {
            session: Some(session.id),
            phase: session.phase,
            status: session.status.clone(),
            progress: session.progress.value(),
            document: Some(session.document.name().to_string()),
            page_count: session.page_count,
            job_id: session.job_id.clone(),
            logs: session.logs.clone(),
            narrative: session.narrative.clone(),
            chart: session.chart.clone(),
            error: self.form_error.clone().or_else(|| session.error.clone()),
            settled: session.is_settled(),
            dirty: self.dirty,
        }
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|session| session.id)
    }

    pub fn phase(&self) -> JobPhase {
        self.session
            .as_ref()
            .map_or(JobPhase::Idle, |session| session.phase)
    }

    /// Returns whether the view changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_document(&mut self, document: DocumentRef) {
        self.form.document = Some(document);
        self.form_error = None;
    }

    pub(crate) fn set_page_count(&mut self, page_count: PageCount) {
        self.form.page_count = page_count;
    }

    /// Start a fresh session from the form, superseding any previous one.
    pub(crate) fn begin_session(&mut self) -> Result<Vec<Effect>, JobError> {
        let document = self.form.document.clone().ok_or(JobError::MissingDocument)?;
        let page_count = self.form.page_count;

        let mut effects = Vec::with_capacity(3);
        if let Some(previous) = self.session.as_ref().filter(|session| !session.closed) {
            effects.push(Effect::Teardown {
                session: previous.id,
            });
        }

        self.last_session += 1;
        let id = self.last_session;
        self.session = Some(Session::start(id, document.clone(), page_count));
        self.form_error = None;

        effects.push(Effect::Submit {
            session: id,
            document,
            page_count,
        });
        effects.push(Effect::StartProgressTimer { session: id });
        Ok(effects)
    }

    pub(crate) fn reject_submission(&mut self, error: JobError) {
        self.form_error = Some(error);
    }

    /// Close the active session; its view stays as last observed.
    pub(crate) fn close_session(&mut self) -> Vec<Effect> {
        match self.session.as_mut().filter(|session| !session.closed) {
            Some(session) => {
                session.closed = true;
                session.progress.freeze();
                vec![Effect::Teardown {
                    session: session.id,
                }]
            }
            None => Vec::new(),
        }
    }

    /// The session addressed by `id`, if it is the current, still open one.
    pub(crate) fn session_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.session
            .as_mut()
            .filter(|session| session.id == id && !session.closed)
    }
}

use std::path::PathBuf;
use std::sync::Arc;

use storyteller_logging::{in_session, monitor_debug, monitor_info, monitor_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::{EventSink, MonitorSettings};
use crate::log_stream::LogStreamCoordinator;
use crate::poller::poll_until_terminal;
use crate::progress_timer::ProgressTimer;
use crate::results::assemble_results;
use crate::{Backend, EngineEvent, SessionId};

/// Shared collaborators handed to every session.
#[derive(Clone)]
pub struct SessionContext {
    pub backend: Arc<dyn Backend>,
    pub settings: MonitorSettings,
    pub sink: Arc<dyn EventSink>,
}

/// Every background task of one monitored job.
///
/// [`MonitorSession::teardown`] is the only cancellation path; it also runs on
/// drop, so replacing a session object tears down the old job's tasks.
pub struct MonitorSession {
    id: SessionId,
    cancel: CancellationToken,
    submission: Option<JoinHandle<()>>,
    poller: Option<JoinHandle<()>>,
    results: Option<JoinHandle<()>>,
    progress: Option<ProgressTimer>,
    logs: LogStreamCoordinator,
}

impl MonitorSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            cancel: CancellationToken::new(),
            submission: None,
            poller: None,
            results: None,
            progress: None,
            logs: LogStreamCoordinator::new(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_torn_down(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn submit(&mut self, ctx: &SessionContext, document: PathBuf, page_count: u32) {
        if self.is_torn_down() || self.submission.is_some() {
            return;
        }
        let SessionContext { backend, sink, .. } = ctx.clone();
        let session = self.id;
        let cancel = self.cancel.child_token();
        monitor_info!(
            "submitting {} (pages={})",
            document.display(),
            page_count
        );
        self.submission = Some(tokio::spawn(in_session(session, async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                outcome = backend.submit(&document, page_count) => outcome,
            };
            match outcome {
                Ok(job_id) => sink.emit(EngineEvent::JobAccepted { session, job_id }),
                Err(error) => {
                    monitor_warn!("submission of {} failed: {}", document.display(), error);
                    sink.emit(EngineEvent::SubmitFailed { session, error });
                }
            }
        })));
    }

    pub fn open_log_stream(&mut self, ctx: &SessionContext, job_id: &str) {
        if self.is_torn_down() {
            return;
        }
        self.logs.open(
            ctx.backend.clone(),
            self.id,
            job_id,
            ctx.sink.clone(),
            &self.cancel,
        );
    }

    pub fn close_log_stream(&mut self) {
        self.logs.close();
    }

    pub fn start_polling(&mut self, ctx: &SessionContext, job_id: &str) {
        if self.is_torn_down() || self.poller.is_some() {
            return;
        }
        let task = poll_until_terminal(
            ctx.backend.clone(),
            self.id,
            job_id.to_string(),
            ctx.settings.poll_interval,
            ctx.sink.clone(),
            self.cancel.child_token(),
        );
        self.poller = Some(tokio::spawn(in_session(self.id, async move {
            task.await;
        })));
    }

    pub fn start_progress_timer(&mut self, ctx: &SessionContext) {
        if self.is_torn_down() {
            return;
        }
        // Replacing the handle stops the previous timer.
        self.progress = Some(ProgressTimer::start(
            self.id,
            ctx.settings.progress_interval,
            ctx.sink.clone(),
            &self.cancel,
        ));
    }

    pub fn stop_progress_timer(&mut self) {
        if let Some(timer) = self.progress.take() {
            timer.stop();
        }
    }

    /// Assemble results once; later requests for the same session are ignored.
    pub fn fetch_results(&mut self, ctx: &SessionContext, job_id: &str) {
        if self.is_torn_down() || self.results.is_some() {
            return;
        }
        let SessionContext { backend, sink, .. } = ctx.clone();
        let session = self.id;
        let job_id = job_id.to_string();
        let cancel = self.cancel.child_token();
        self.results = Some(tokio::spawn(in_session(session, async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                outcome = assemble_results(backend.as_ref(), &job_id) => outcome,
            };
            match outcome {
                Ok(results) => sink.emit(EngineEvent::ResultsAssembled {
                    session,
                    job_id,
                    results,
                }),
                Err(error) => {
                    monitor_warn!("results for job {} unavailable: {}", job_id, error);
                    sink.emit(EngineEvent::ResultsFailed { session, error });
                }
            }
        })));
    }

    pub fn is_log_stream_open(&self) -> bool {
        self.logs.is_open()
    }

    pub fn is_progress_running(&self) -> bool {
        self.progress.as_ref().is_some_and(ProgressTimer::is_running)
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn teardown(&mut self) {
        if self.is_torn_down() {
            return;
        }
        self.cancel.cancel();
        self.stop_progress_timer();
        self.logs.close();
        for task in [
            self.submission.take(),
            self.poller.take(),
            self.results.take(),
        ]
        .into_iter()
        .flatten()
        {
            task.abort();
        }
        monitor_debug!("session {} torn down", self.id);
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.teardown();
    }
}

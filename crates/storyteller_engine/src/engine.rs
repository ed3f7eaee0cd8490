use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use storyteller_logging::monitor_debug;
use tokio::sync::mpsc as async_mpsc;

use crate::session::{MonitorSession, SessionContext};
use crate::{Backend, EngineEvent, SessionId};

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Delay between a resolved `running` poll and the next request.
    pub poll_interval: Duration,
    /// Cadence of progress-estimate ticks.
    pub progress_interval: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            progress_interval: Duration::from_millis(500),
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug)]
enum EngineCommand {
    Submit {
        session: SessionId,
        document: PathBuf,
        page_count: u32,
    },
    OpenLogStream { session: SessionId, job_id: String },
    CloseLogStream { session: SessionId },
    StartPolling { session: SessionId, job_id: String },
    StartProgressTimer { session: SessionId },
    StopProgressTimer { session: SessionId },
    FetchResults { session: SessionId, job_id: String },
    Teardown { session: SessionId },
}

/// Handle to the engine thread.
///
/// All engine work runs as tasks on one single-threaded runtime; dropping the
/// handle tears down the active session and joins the thread.
pub struct EngineHandle {
    cmd_tx: Option<async_mpsc::UnboundedSender<EngineCommand>>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: Option<thread::JoinHandle<()>>,
}

impl EngineHandle {
    pub fn new(backend: Arc<dyn Backend>, settings: MonitorSettings) -> Result<Self, EngineError> {
        let (cmd_tx, mut cmd_rx) = async_mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let ctx = SessionContext {
            backend,
            settings,
            sink: Arc::new(ChannelEventSink::new(event_tx)),
        };

        let worker = thread::spawn(move || {
            runtime.block_on(async move {
                let mut registry = SessionRegistry::new(ctx);
                while let Some(command) = cmd_rx.recv().await {
                    registry.handle(command);
                }
                registry.shutdown();
            });
        });

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            event_rx,
            worker: Some(worker),
        })
    }

    pub fn submit(&self, session: SessionId, document: impl Into<PathBuf>, page_count: u32) {
        self.send(EngineCommand::Submit {
            session,
            document: document.into(),
            page_count,
        });
    }

    pub fn open_log_stream(&self, session: SessionId, job_id: impl Into<String>) {
        self.send(EngineCommand::OpenLogStream {
            session,
            job_id: job_id.into(),
        });
    }

    pub fn close_log_stream(&self, session: SessionId) {
        self.send(EngineCommand::CloseLogStream { session });
    }

    pub fn start_polling(&self, session: SessionId, job_id: impl Into<String>) {
        self.send(EngineCommand::StartPolling {
            session,
            job_id: job_id.into(),
        });
    }

    pub fn start_progress_timer(&self, session: SessionId) {
        self.send(EngineCommand::StartProgressTimer { session });
    }

    pub fn stop_progress_timer(&self, session: SessionId) {
        self.send(EngineCommand::StopProgressTimer { session });
    }

    pub fn fetch_results(&self, session: SessionId, job_id: impl Into<String>) {
        self.send(EngineCommand::FetchResults {
            session,
            job_id: job_id.into(),
        });
    }

    pub fn teardown(&self, session: SessionId) {
        self.send(EngineCommand::Teardown { session });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn send(&self, command: EngineCommand) {
        if let Some(tx) = &self.cmd_tx {
            let _ = tx.send(command);
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        // Closing the command channel ends the engine loop.
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Holds the single active session; commands for any other session are dropped.
struct SessionRegistry {
    ctx: SessionContext,
    active: Option<MonitorSession>,
}

impl SessionRegistry {
    fn new(ctx: SessionContext) -> Self {
        Self { ctx, active: None }
    }

    fn handle(&mut self, command: EngineCommand) {
        match command {
            EngineCommand::Submit {
                session,
                document,
                page_count,
            } => {
                // Supersede: the previous session is torn down before the new one starts.
                if let Some(mut previous) = self.active.take() {
                    previous.teardown();
                }
                let mut fresh = MonitorSession::new(session);
                storyteller_logging::with_session(session, || {
                    fresh.submit(&self.ctx, document, page_count)
                });
                self.active = Some(fresh);
            }
            EngineCommand::Teardown { session } => {
                if self.active.as_ref().is_some_and(|active| active.id() == session) {
                    if let Some(mut active) = self.active.take() {
                        active.teardown();
                    }
                }
            }
            EngineCommand::OpenLogStream { session, job_id } => {
                let ctx = self.ctx.clone();
                self.with_session(session, |active| active.open_log_stream(&ctx, &job_id));
            }
            EngineCommand::CloseLogStream { session } => {
                self.with_session(session, MonitorSession::close_log_stream);
            }
            EngineCommand::StartPolling { session, job_id } => {
                let ctx = self.ctx.clone();
                self.with_session(session, |active| active.start_polling(&ctx, &job_id));
            }
            EngineCommand::StartProgressTimer { session } => {
                let ctx = self.ctx.clone();
                self.with_session(session, |active| active.start_progress_timer(&ctx));
            }
            EngineCommand::StopProgressTimer { session } => {
                self.with_session(session, MonitorSession::stop_progress_timer);
            }
            EngineCommand::FetchResults { session, job_id } => {
                let ctx = self.ctx.clone();
                self.with_session(session, |active| active.fetch_results(&ctx, &job_id));
            }
        }
    }

    fn with_session(&mut self, session: SessionId, apply: impl FnOnce(&mut MonitorSession)) {
        match self.active.as_mut().filter(|active| active.id() == session) {
            Some(active) => storyteller_logging::with_session(session, || apply(active)),
            None => monitor_debug!("dropping command for inactive session {}", session),
        }
    }

    fn shutdown(&mut self) {
        if let Some(mut active) = self.active.take() {
            active.teardown();
        }
    }
}

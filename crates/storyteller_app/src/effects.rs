use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use storyteller_core::{ArtifactFailure, BackendStatus, Effect, JobId, Msg};
use storyteller_engine::{
    export_artifacts, AssembledResults, Backend, ChartOutcome, EngineError, EngineEvent,
    EngineHandle, JobStatus, MonitorSettings, NarrativeOutcome,
};
use storyteller_logging::{monitor_debug, monitor_info, monitor_warn};

/// Executes core effects on the engine and translates engine events back
/// into core messages.
pub struct EffectRunner {
    engine: EngineHandle,
    output_dir: Option<PathBuf>,
}

impl EffectRunner {
    pub fn new(
        backend: Arc<dyn Backend>,
        settings: MonitorSettings,
        output_dir: Option<PathBuf>,
    ) -> Result<Self, EngineError> {
        Ok(Self {
            engine: EngineHandle::new(backend, settings)?,
            output_dir,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            monitor_debug!("effect {:?}", effect);
            match effect {
                Effect::Submit {
                    session,
                    document,
                    page_count,
                } => {
                    self.engine
                        .submit(session, document.path().to_path_buf(), page_count.get());
                }
                Effect::StartProgressTimer { session } => self.engine.start_progress_timer(session),
                Effect::StopProgressTimer { session } => self.engine.stop_progress_timer(session),
                Effect::OpenLogStream { session, job_id } => {
                    self.engine.open_log_stream(session, job_id.as_str());
                }
                Effect::CloseLogStream { session } => self.engine.close_log_stream(session),
                Effect::StartPolling { session, job_id } => {
                    self.engine.start_polling(session, job_id.as_str());
                }
                Effect::FetchResults { session, job_id } => {
                    self.engine.fetch_results(session, job_id.as_str());
                }
                Effect::Teardown { session } => self.engine.teardown(session),
            }
        }
    }

    /// Wait up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine
            .recv_timeout(timeout)
            .map(|event| self.map_event(event))
    }

    pub fn try_next_msg(&self) -> Option<Msg> {
        self.engine.try_recv().map(|event| self.map_event(event))
    }

    fn map_event(&self, event: EngineEvent) -> Msg {
        match event {
            EngineEvent::JobAccepted { session, job_id } => {
                monitor_info!("job {} accepted", job_id);
                Msg::JobAccepted {
                    session,
                    job_id: JobId::new(job_id),
                }
            }
            EngineEvent::SubmitFailed { session, error } => Msg::SubmitFailed {
                session,
                reason: error.to_string(),
            },
            EngineEvent::StatusReported { session, report } => {
                if let Some(detail) = &report.detail {
                    monitor_debug!("status {} ({})", report.status.as_str(), detail);
                }
                Msg::StatusReported {
                    session,
                    status: map_status(report.status),
                    detail: report.detail,
                }
            }
            EngineEvent::StatusCheckFailed { session, error } => Msg::StatusCheckFailed {
                session,
                reason: error.to_string(),
            },
            EngineEvent::LogLine { session, line } => Msg::LogLine { session, line },
            EngineEvent::ProgressTick { session } => Msg::ProgressTick { session },
            EngineEvent::ResultsAssembled {
                session,
                job_id,
                results,
            } => {
                self.export(&job_id, &results);
                let AssembledResults { narrative, chart } = results;
                Msg::ResultsAssembled {
                    session,
                    narrative: match narrative {
                        NarrativeOutcome::Loaded { text, .. } => Ok(text),
                        NarrativeOutcome::Failed {
                            reason,
                            download_url,
                            ..
                        } => Err(ArtifactFailure {
                            reason,
                            download_url,
                        }),
                    },
                    chart: match chart {
                        ChartOutcome::Available { url, .. } => Ok(url),
                        ChartOutcome::Unavailable { reason, .. } => Err(reason),
                    },
                }
            }
            EngineEvent::ResultsFailed { session, error } => Msg::ResultsFailed {
                session,
                reason: error.to_string(),
            },
        }
    }

    fn export(&self, job_id: &str, results: &AssembledResults) {
        let Some(dir) = &self.output_dir else {
            return;
        };
        match export_artifacts(dir, job_id, results) {
            Ok(summary) => monitor_info!(
                "exported artifacts of job {} to {}",
                job_id,
                summary.manifest_path.display()
            ),
            Err(err) => monitor_warn!("export of job {} failed: {}", job_id, err),
        }
    }
}

fn map_status(status: JobStatus) -> BackendStatus {
    match status {
        JobStatus::Running => BackendStatus::Running,
        JobStatus::Completed => BackendStatus::Completed,
        JobStatus::Failed => BackendStatus::Failed,
        JobStatus::Unrecognized(raw) => BackendStatus::Unrecognized(raw),
    }
}

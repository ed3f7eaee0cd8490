use std::sync::Arc;
use std::time::Duration;

use storyteller_logging::{monitor_debug, monitor_info, monitor_warn};
use tokio_util::sync::CancellationToken;

use crate::engine::EventSink;
use crate::{Backend, EngineEvent, JobStatus, SessionId};

/// How a polling loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollEnd {
    /// The backend reported something other than `running`.
    Terminal(JobStatus),
    /// A request failed in transport.
    TransportFailure,
    Cancelled,
}

/// Poll `job_id` until a terminal status, a transport failure, or cancellation.
///
/// Each poll is fully resolved and reported before the next one is scheduled,
/// so requests never overlap. There is no retry ceiling: a job that keeps
/// reporting `running` is polled indefinitely.
pub async fn poll_until_terminal(
    backend: Arc<dyn Backend>,
    session: SessionId,
    job_id: String,
    interval: Duration,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) -> PollEnd {
    let mut polls: u64 = 0;
    loop {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                monitor_debug!("polling for job {} abandoned after {} polls", job_id, polls);
                return PollEnd::Cancelled;
            }
            outcome = backend.poll_status(&job_id) => outcome,
        };
        polls += 1;

        match outcome {
            Ok(report) => {
                let status = report.status.clone();
                sink.emit(EngineEvent::StatusReported { session, report });
                if !status.is_running() {
                    monitor_info!(
                        "job {} reached status {} after {} polls",
                        job_id,
                        status.as_str(),
                        polls
                    );
                    return PollEnd::Terminal(status);
                }
            }
            Err(error) => {
                monitor_warn!("status check for job {} failed: {}", job_id, error);
                sink.emit(EngineEvent::StatusCheckFailed { session, error });
                return PollEnd::TransportFailure;
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return PollEnd::Cancelled,
            _ = tokio::time::sleep(interval) => {}
        }
    }
}

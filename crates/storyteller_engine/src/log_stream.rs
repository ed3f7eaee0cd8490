use std::sync::Arc;

use futures_util::StreamExt;
use storyteller_logging::{in_session, monitor_debug, monitor_info, monitor_warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::engine::EventSink;
use crate::{Backend, EngineEvent, SessionId};

struct LogSubscription {
    job_id: String,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Owns at most one log-stream subscription and relays its messages as
/// [`EngineEvent::LogLine`], one event per message.
#[derive(Default)]
pub struct LogStreamCoordinator {
    subscription: Option<LogSubscription>,
}

impl LogStreamCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a subscription for `job_id`, closing any previous one first.
    ///
    /// Must be called from within a tokio runtime.
    pub fn open(
        &mut self,
        backend: Arc<dyn Backend>,
        session: SessionId,
        job_id: &str,
        sink: Arc<dyn EventSink>,
        parent: &CancellationToken,
    ) {
        self.close();
        let cancel = parent.child_token();
        let task = tokio::spawn(in_session(
            session,
            relay_log_lines(backend, session, job_id.to_string(), sink, cancel.clone()),
        ));
        monitor_info!("log stream opened for job {}", job_id);
        self.subscription = Some(LogSubscription {
            job_id: job_id.to_string(),
            cancel,
            task,
        });
    }

    /// Close the current subscription. Safe to call repeatedly or before any `open`.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel.cancel();
            subscription.task.abort();
            monitor_debug!("log stream closed for job {}", subscription.job_id);
        }
    }

    pub fn is_open(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn job_id(&self) -> Option<&str> {
        self.subscription
            .as_ref()
            .map(|subscription| subscription.job_id.as_str())
    }
}

impl Drop for LogStreamCoordinator {
    fn drop(&mut self) {
        self.close();
    }
}

async fn relay_log_lines(
    backend: Arc<dyn Backend>,
    session: SessionId,
    job_id: String,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
) {
    let opened = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        opened = backend.open_log_stream(&job_id) => opened,
    };
    let mut lines = match opened {
        Ok(lines) => lines,
        Err(err) => {
            monitor_warn!("log stream for job {} could not be opened: {}", job_id, err);
            return;
        }
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = lines.next() => next,
        };
        match next {
            Some(Ok(line)) => sink.emit(EngineEvent::LogLine { session, line }),
            Some(Err(err)) => {
                monitor_warn!("log stream for job {} failed: {}", job_id, err);
                return;
            }
            None => {
                monitor_debug!("log stream for job {} ended", job_id);
                return;
            }
        }
    }
}

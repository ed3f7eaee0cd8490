use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::engine::EventSink;
use crate::{EngineEvent, SessionId};

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Emits [`EngineEvent::ProgressTick`] on a fixed cadence until stopped.
///
/// The timer never outlives its handle: dropping it stops the task.
pub struct ProgressTimer {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressTimer {
    /// Must be called from within a tokio runtime. A zero `interval` is
    /// raised to one millisecond.
    pub fn start(
        session: SessionId,
        interval: Duration,
        sink: Arc<dyn EventSink>,
        parent: &CancellationToken,
    ) -> Self {
        let interval = interval.max(MIN_INTERVAL);
        let cancel = parent.child_token();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => sink.emit(EngineEvent::ProgressTick { session }),
                }
            }
        });
        Self { cancel, task }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for ProgressTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

use std::path::PathBuf;
use std::time::{Duration, Instant};

use storyteller_core::{update, AppState, DocumentRef, MonitorView, Msg};
use storyteller_logging::monitor_debug;

use crate::effects::EffectRunner;

const IDLE_WAIT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing further happens without user input.
    Settled(MonitorView),
    /// The deadline passed first; the session is still live.
    TimedOut(MonitorView),
}

impl RunOutcome {
    pub fn view(&self) -> &MonitorView {
        match self {
            RunOutcome::Settled(view) | RunOutcome::TimedOut(view) => view,
        }
    }
}

/// Drives the state machine: every message goes through `update`, every
/// effect goes to the runner.
pub struct JobMonitor {
    state: AppState,
    runner: EffectRunner,
}

impl JobMonitor {
    pub fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    /// Apply one message; returns whether the view changed.
    pub fn dispatch(&mut self, msg: Msg) -> bool {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
        self.state.consume_dirty()
    }

    pub fn view(&self) -> MonitorView {
        self.state.view()
    }

    /// Fill the form and press submit.
    pub fn submit(&mut self, document: impl Into<PathBuf>, pages: &str) -> bool {
        let mut changed = self.dispatch(Msg::DocumentSelected(DocumentRef::from_path(document)));
        changed |= self.dispatch(Msg::PageCountChanged(pages.to_string()));
        changed |= self.dispatch(Msg::SubmitClicked);
        changed
    }

    /// Wait up to `wait` for one engine event, then drain whatever else is
    /// queued. Returns whether the view changed.
    pub fn pump(&mut self, wait: Duration) -> bool {
        let Some(first) = self.runner.next_msg(wait) else {
            return false;
        };
        let mut changed = self.dispatch(first);
        while let Some(msg) = self.runner.try_next_msg() {
            changed |= self.dispatch(msg);
        }
        changed
    }

    /// Pump until the session settles or `deadline` elapses, calling
    /// `on_change` with every changed view.
    pub fn run_until_settled(
        &mut self,
        deadline: Option<Duration>,
        mut on_change: impl FnMut(&MonitorView),
    ) -> RunOutcome {
        let started = Instant::now();
        loop {
            let view = self.view();
            if view.settled || view.session.is_none() {
                return RunOutcome::Settled(view);
            }
            let wait = match deadline {
                Some(limit) => match limit.checked_sub(started.elapsed()) {
                    Some(left) if !left.is_zero() => left.min(IDLE_WAIT),
                    _ => return RunOutcome::TimedOut(view),
                },
                None => IDLE_WAIT,
            };
            if self.pump(wait) {
                on_change(&self.view());
            }
        }
    }

    /// Close the live session, if any; its background tasks are torn down.
    pub fn shutdown(&mut self) {
        if self.dispatch(Msg::SessionClosed) {
            monitor_debug!("session closed");
        }
    }
}

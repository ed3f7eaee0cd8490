use crate::{AppState, Effect, Msg, PageCount, SessionId};

/// Pure update function: applies a message to state and returns any effects.
///
/// Messages addressed to a session other than the current one are dropped, so
/// late responses from a superseded job never touch the new job's state.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::DocumentSelected(document) => {
            state.select_document(document);
            state.mark_dirty();
            Vec::new()
        }
        Msg::PageCountChanged(raw) => {
            state.set_page_count(PageCount::parse_or_default(&raw));
            state.mark_dirty();
            Vec::new()
        }
        Msg::SubmitClicked => {
            state.mark_dirty();
            match state.begin_session() {
                Ok(effects) => effects,
                Err(error) => {
                    state.reject_submission(error);
                    Vec::new()
                }
            }
        }
        Msg::JobAccepted { session, job_id } => {
            on_session(&mut state, session, |active| active.accept(job_id))
        }
        Msg::SubmitFailed { session, reason } => {
            on_session(&mut state, session, |active| active.submit_failed(reason))
        }
        Msg::StatusReported {
            session,
            status,
            detail,
        } => on_session(&mut state, session, |active| {
            active.status_reported(status, detail)
        }),
        Msg::StatusCheckFailed { session, reason } => on_session(&mut state, session, |active| {
            active.status_check_failed(reason)
        }),
        Msg::LogLine { session, line } => on_session(&mut state, session, |active| {
            active.append_log(line);
            Vec::new()
        }),
        Msg::ProgressTick { session } => {
            on_session(&mut state, session, |active| active.progress_tick())
        }
        Msg::ResultsAssembled {
            session,
            narrative,
            chart,
        } => on_session(&mut state, session, |active| {
            active.results_assembled(narrative, chart);
            Vec::new()
        }),
        Msg::ResultsFailed { session, reason } => on_session(&mut state, session, |active| {
            active.results_failed(reason);
            Vec::new()
        }),
        Msg::SessionClosed => {
            let effects = state.close_session();
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn on_session(
    state: &mut AppState,
    session: SessionId,
    apply: impl FnOnce(&mut crate::state::Session) -> Vec<Effect>,
) -> Vec<Effect> {
    match state.session_mut(session) {
        Some(active) => {
            let effects = apply(active);
            state.mark_dirty();
            effects
        }
        None => Vec::new(),
    }
}

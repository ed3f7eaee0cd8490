#![allow(dead_code)]

use std::sync::Once;

use storyteller_core::{update, AppState, BackendStatus, DocumentRef, Effect, JobId, Msg, SessionId};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(storyteller_logging::initialize_for_tests);
}

pub fn submit(state: AppState, path: &str) -> (AppState, Vec<Effect>) {
    let (state, _) = update(state, Msg::DocumentSelected(DocumentRef::from_path(path)));
    update(state, Msg::SubmitClicked)
}

/// Submit and have the backend accept the job.
pub fn accepted(state: AppState, job_id: &str) -> (AppState, SessionId) {
    let (state, _) = submit(state, "/tmp/10k.pdf");
    let session = state.session_id().expect("session started");
    let (state, _) = update(
        state,
        Msg::JobAccepted {
            session,
            job_id: JobId::new(job_id),
        },
    );
    (state, session)
}

pub fn report(state: AppState, session: SessionId, status: &str) -> (AppState, Vec<Effect>) {
    report_with_detail(state, session, status, None)
}

pub fn report_with_detail(
    state: AppState,
    session: SessionId,
    status: &str,
    detail: Option<&str>,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusReported {
            session,
            status: BackendStatus::from_wire(status),
            detail: detail.map(str::to_string),
        },
    )
}

pub fn tick(state: AppState, session: SessionId, times: usize) -> AppState {
    (0..times).fold(state, |state, _| {
        update(state, Msg::ProgressTick { session }).0
    })
}

pub fn fetch_results_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::FetchResults { .. }))
        .count()
}

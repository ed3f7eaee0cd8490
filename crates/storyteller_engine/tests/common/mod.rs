#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use storyteller_engine::{
    Artifact, Backend, EngineEvent, EventSink, FailureKind, JobStatus, LogLines, ResultNames,
    StatusReport, TransportError,
};
use tokio::sync::mpsc;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(storyteller_logging::initialize_for_tests);
}

pub fn status(raw: &str) -> Result<StatusReport, TransportError> {
    Ok(StatusReport {
        status: JobStatus::from_wire(raw),
        detail: None,
    })
}

pub fn network_error(message: &str) -> TransportError {
    TransportError::new(FailureKind::Network, message)
}

pub fn text_artifact(name: &str, text: &str) -> Result<Artifact, TransportError> {
    Ok(Artifact {
        name: name.to_string(),
        bytes: Bytes::from(text.to_string()),
        content_type: Some("text/plain; charset=utf-8".to_string()),
    })
}

/// In-memory backend driven by scripted responses.
///
/// Polls sleep `poll_delay` before taking the next scripted status; when the
/// script is exhausted the request never resolves.
#[derive(Default)]
pub struct ScriptedBackend {
    submit_error: Mutex<Option<TransportError>>,
    submitted: AtomicU64,
    statuses: Mutex<VecDeque<Result<StatusReport, TransportError>>>,
    poll_delay: Duration,
    log_streams: Mutex<VecDeque<mpsc::UnboundedReceiver<String>>>,
    results: Mutex<Option<Result<ResultNames, TransportError>>>,
    artifacts: Mutex<HashMap<String, Result<Artifact, TransportError>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<StatusReport, TransportError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn with_submit_error(self, error: TransportError) -> Self {
        *self.submit_error.lock().unwrap() = Some(error);
        self
    }

    /// Queue a log stream; returns the sender feeding it.
    pub fn add_log_stream(&self) -> mpsc::UnboundedSender<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.log_streams.lock().unwrap().push_back(rx);
        tx
    }

    pub fn with_results(self, results: Result<ResultNames, TransportError>) -> Self {
        *self.results.lock().unwrap() = Some(results);
        self
    }

    pub fn with_artifact(self, name: &str, artifact: Result<Artifact, TransportError>) -> Self {
        self.artifacts
            .lock()
            .unwrap()
            .insert(name.to_string(), artifact);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl Backend for ScriptedBackend {
    async fn submit(&self, document: &Path, page_count: u32) -> Result<String, TransportError> {
        self.record(format!("submit:{}:{page_count}", document.display()));
        if let Some(error) = self.submit_error.lock().unwrap().clone() {
            return Err(error);
        }
        let n = self.submitted.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("j{n}"))
    }

    async fn poll_status(&self, job_id: &str) -> Result<StatusReport, TransportError> {
        self.record(format!("status:{job_id}"));
        tokio::time::sleep(self.poll_delay).await;
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(report) => report,
            None => std::future::pending().await,
        }
    }

    async fn open_log_stream(&self, job_id: &str) -> Result<LogLines, TransportError> {
        self.record(format!("logs:{job_id}"));
        let rx = self
            .log_streams
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| network_error("no log stream scripted"))?;
        Ok(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|line| (Ok(line), rx))
        })
        .boxed())
    }

    async fn results(&self, job_id: &str) -> Result<ResultNames, TransportError> {
        self.record(format!("results:{job_id}"));
        self.results
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Err(network_error("no results scripted")))
    }

    async fn fetch_artifact(&self, name: &str) -> Result<Artifact, TransportError> {
        self.record(format!("download:{name}"));
        self.artifacts
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::new(FailureKind::HttpStatus(404), "Not Found")))
    }

    fn artifact_url(&self, name: &str) -> String {
        format!("http://backend.test/api/download/{name}")
    }
}

#[derive(Default, Clone)]
pub struct CollectingSink {
    events: Arc<Mutex<Vec<EngineEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn log_lines(&self) -> Vec<(u64, String)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::LogLine { session, line } => Some((session, line)),
                _ => None,
            })
            .collect()
    }

    /// Wait (in real time) until `predicate` holds for the collected events.
    pub async fn wait_until(&self, predicate: impl Fn(&[EngineEvent]) -> bool) -> bool {
        for _ in 0..400 {
            if predicate(&self.events()) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        false
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

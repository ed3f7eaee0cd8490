use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{self, BoxStream, Stream};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::sse::SseDecoder;
use crate::{Artifact, FailureKind, JobStatus, ResultNames, StatusReport, TransportError};

/// Messages of one job's log stream, in delivery order.
pub type LogLines = BoxStream<'static, Result<String, TransportError>>;

#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// API root; endpoints live under `{base_url}/api/`.
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Applies to every request except the open-ended log stream.
    pub request_timeout: Duration,
}

impl BackendSettings {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP/SSE boundary to the analysis backend.
///
/// No retries happen here; every failure is returned to the caller as a
/// [`TransportError`].
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    async fn submit(&self, document: &Path, page_count: u32) -> Result<String, TransportError>;

    async fn poll_status(&self, job_id: &str) -> Result<StatusReport, TransportError>;

    async fn open_log_stream(&self, job_id: &str) -> Result<LogLines, TransportError>;

    async fn results(&self, job_id: &str) -> Result<ResultNames, TransportError>;

    async fn fetch_artifact(&self, name: &str) -> Result<Artifact, TransportError>;

    fn artifact_url(&self, name: &str) -> String;
}

#[derive(Deserialize)]
struct SubmitPayload {
    #[serde(alias = "jobId")]
    job_id: String,
}

#[derive(Deserialize)]
struct StatusPayload {
    status: String,
    #[serde(default)]
    detail: Option<String>,
}

#[derive(Deserialize)]
struct ResultsPayload {
    narrative: String,
    sankey: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestBackend {
    api_root: String,
    client: reqwest::Client,
    stream_client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(settings: BackendSettings) -> Result<Self, TransportError> {
        let parsed = Url::parse(&settings.base_url)
            .map_err(|err| TransportError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(TransportError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as an API root", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(map_reqwest_error)?;
        let stream_client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            api_root: parsed.as_str().trim_end_matches('/').to_string(),
            client,
            stream_client,
        })
    }

    fn endpoint(&self, route: &str, segment: Option<&str>) -> String {
        let mut url = format!("{}/api/{route}", self.api_root);
        if let Some(segment) = segment {
            url.push('/');
            url.push_str(&urlencoding::encode(segment));
        }
        url
    }
}

#[async_trait::async_trait]
impl Backend for ReqwestBackend {
    async fn submit(&self, document: &Path, page_count: u32) -> Result<String, TransportError> {
        let bytes = tokio::fs::read(document).await.map_err(|err| {
            TransportError::new(FailureKind::Io, format!("{}: {err}", document.display()))
        })?;
        let file_name = document
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")
            .map_err(map_reqwest_error)?;
        let form = Form::new()
            .part("file", part)
            .text("pages", page_count.to_string());

        let response = self
            .client
            .post(self.endpoint("upload_pdf", None))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: SubmitPayload = read_json(response).await?;
        Ok(payload.job_id)
    }

    async fn poll_status(&self, job_id: &str) -> Result<StatusReport, TransportError> {
        let response = self
            .client
            .get(self.endpoint("status", Some(job_id)))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: StatusPayload = read_json(response).await?;
        Ok(StatusReport {
            status: JobStatus::from_wire(&payload.status),
            detail: payload.detail,
        })
    }

    async fn open_log_stream(&self, job_id: &str) -> Result<LogLines, TransportError> {
        let response = self
            .stream_client
            .get(self.endpoint("logs", Some(job_id)))
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        Ok(log_lines(response.bytes_stream()))
    }

    async fn results(&self, job_id: &str) -> Result<ResultNames, TransportError> {
        let response = self
            .client
            .get(self.endpoint("results", Some(job_id)))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let payload: ResultsPayload = read_json(response).await?;
        Ok(ResultNames {
            narrative: payload.narrative,
            sankey: payload.sankey,
        })
    }

    async fn fetch_artifact(&self, name: &str) -> Result<Artifact, TransportError> {
        let response = self
            .client
            .get(self.artifact_url(name))
            .send()
            .await
            .map_err(map_reqwest_error)?;
        if !response.status().is_success() {
            return Err(reject(response).await);
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(Artifact {
            name: name.to_string(),
            bytes,
            content_type,
        })
    }

    fn artifact_url(&self, name: &str) -> String {
        self.endpoint("download", Some(name))
    }
}

/// Decode a JSON payload, turning `{"error": ..}` bodies and non-2xx statuses
/// into errors before the typed decode.
async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, TransportError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_reqwest_error)?;
    if !status.is_success() {
        return Err(rejection(status, &body));
    }

    let value: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))?;
    if let Some(error) = backend_error(&value) {
        return Err(error);
    }
    serde_json::from_value(value)
        .map_err(|err| TransportError::new(FailureKind::Decode, err.to_string()))
}

/// Error for a non-2xx response: the backend's own `error` text when the body
/// carries one, the status otherwise.
async fn reject(response: reqwest::Response) -> TransportError {
    let status = response.status();
    match response.bytes().await {
        Ok(body) => rejection(status, &body),
        Err(_) => status_error(status),
    }
}

fn rejection(status: StatusCode, body: &[u8]) -> TransportError {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| backend_error(&value))
        .unwrap_or_else(|| status_error(status))
}

fn backend_error(value: &serde_json::Value) -> Option<TransportError> {
    let message = match value.get("error")? {
        serde_json::Value::Null => return None,
        serde_json::Value::String(message) => message.clone(),
        other => other.to_string(),
    };
    Some(TransportError::new(FailureKind::Backend, message))
}

fn status_error(status: StatusCode) -> TransportError {
    TransportError::new(
        FailureKind::HttpStatus(status.as_u16()),
        status.canonical_reason().unwrap_or("unknown status"),
    )
}

fn log_lines<S>(bytes: S) -> LogLines
where
    S: Stream<Item = reqwest::Result<Bytes>> + Send + 'static,
{
    let state = (Some(Box::pin(bytes)), SseDecoder::new(), VecDeque::new());
    stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
        loop {
            if let Some(line) = pending.pop_front() {
                return Some((Ok(line), (bytes, decoder, pending)));
            }
            let next = bytes.as_mut()?.next().await;
            match next {
                Some(Ok(chunk)) => pending.extend(decoder.feed(&chunk)),
                Some(Err(err)) => {
                    return Some((Err(map_reqwest_error(err)), (None, decoder, pending)));
                }
                None => return None,
            }
        }
    })
    .boxed()
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return TransportError::new(FailureKind::Decode, err.to_string());
    }
    TransportError::new(FailureKind::Network, err.to_string())
}

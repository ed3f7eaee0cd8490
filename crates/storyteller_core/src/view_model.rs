use std::borrow::Cow;

use crate::{JobError, JobId, JobPhase, LogBuffer, PageCount, SessionId};

pub const NARRATIVE_PLACEHOLDER: &str = "No narrative loaded.";
pub const LOGS_PLACEHOLDER: &str = "Waiting for logs...";
const CHART_UNAVAILABLE: &str = "No Sankey chart available";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NarrativeView {
    #[default]
    NotLoaded,
    Loaded(String),
    /// The artifact exists but could not be fetched; the user gets a direct link.
    Fallback {
        reason: String,
        download_url: String,
    },
}

impl NarrativeView {
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            NarrativeView::NotLoaded => Cow::Borrowed(NARRATIVE_PLACEHOLDER),
            NarrativeView::Loaded(text) => Cow::Borrowed(text),
            NarrativeView::Fallback {
                reason,
                download_url,
            } => Cow::Owned(format!(
                "Failed to load narrative: {reason}\n\nYou can download it directly: {download_url}"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ChartView {
    #[default]
    NotLoaded,
    Available {
        url: String,
    },
    Unavailable {
        reason: String,
    },
}

impl ChartView {
    pub fn url(&self) -> Option<&str> {
        match self {
            ChartView::Available { url } => Some(url),
            ChartView::NotLoaded | ChartView::Unavailable { .. } => None,
        }
    }

    pub fn describe(&self) -> &str {
        self.url().unwrap_or(CHART_UNAVAILABLE)
    }
}

/// Everything the presentation layer reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MonitorView {
    pub session: Option<SessionId>,
    pub phase: JobPhase,
    /// Last status label: `Uploading...`, a raw backend status, or `Error`.
    pub status: String,
    pub progress: u8,
    pub document: Option<String>,
    pub page_count: PageCount,
    pub job_id: Option<JobId>,
    pub logs: LogBuffer,
    pub narrative: NarrativeView,
    pub chart: ChartView,
    pub error: Option<JobError>,
    /// Nothing further will happen without user input.
    pub settled: bool,
    pub dirty: bool,
}

impl MonitorView {
    pub fn logs_text(&self) -> Cow<'_, str> {
        if self.logs.is_empty() {
            Cow::Borrowed(LOGS_PLACEHOLDER)
        } else {
            Cow::Owned(self.logs.render())
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

use chrono::Local;
use storyteller_core::{ChartView, JobPhase, MonitorView, NarrativeView, SessionId};

/// Turns successive views into terminal lines, printing only what changed.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    session: Option<SessionId>,
    printed_logs: usize,
    last_status: Option<String>,
    reported: bool,
}

impl TerminalRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &MonitorView) -> Vec<String> {
        if view.session != self.session {
            *self = Self {
                session: view.session,
                ..Self::default()
            };
        }

        let mut lines = Vec::new();
        let stamp = Local::now().format("%H:%M:%S");

        if view.session.is_none() {
            if let Some(message) = view.error_message() {
                lines.push(format!("[{stamp}] {message}"));
            }
            return lines;
        }

        for line in view.logs.lines().iter().skip(self.printed_logs) {
            lines.push(format!("[{stamp}] | {line}"));
        }
        self.printed_logs = view.logs.len();

        let status = status_line(view);
        if self.last_status.as_deref() != Some(status.as_str()) {
            lines.push(format!("[{stamp}] {status}"));
            self.last_status = Some(status);
        }

        if view.settled && !self.reported {
            self.reported = true;
            lines.extend(final_report(view).lines().map(str::to_string));
        }
        lines
    }
}

pub fn status_line(view: &MonitorView) -> String {
    let mut line = format!("{:<10} {:>3}%", phase_label(view.phase), view.progress);
    if !view.status.is_empty() {
        line.push_str("  status: ");
        line.push_str(&view.status);
    }
    if let Some(job_id) = &view.job_id {
        line.push_str("  job: ");
        line.push_str(job_id.as_str());
    }
    line
}

pub fn final_report(view: &MonitorView) -> String {
    let mut report = String::new();
    report.push_str("== Narrative ==\n");
    report.push_str(&view.narrative.text());
    report.push('\n');

    report.push_str("== Sankey chart ==\n");
    report.push_str(view.chart.describe());
    report.push('\n');
    if let ChartView::Unavailable { reason } = &view.chart {
        report.push_str(&format!("({reason})\n"));
    }

    if let Some(message) = view.error_message() {
        report.push_str("== Error ==\n");
        report.push_str(&message);
        report.push('\n');
    }

    if view.logs.is_empty() && matches!(view.narrative, NarrativeView::NotLoaded) {
        report.push_str("== Logs ==\n");
        report.push_str(&view.logs_text());
        report.push('\n');
    }
    report
}

fn phase_label(phase: JobPhase) -> &'static str {
    match phase {
        JobPhase::Idle => "Idle",
        JobPhase::Uploading => "Uploading",
        JobPhase::Running => "Running",
        JobPhase::Completed => "Completed",
        JobPhase::Failed => "Failed",
    }
}

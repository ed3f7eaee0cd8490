use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use storyteller_engine::{BackendSettings, MonitorSettings};

pub const API_URL_ENV: &str = "STORYTELLER_API_URL";
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Submit a 10-K PDF for analysis and follow the job until its narrative and
/// Sankey chart are ready.
#[derive(Debug, Clone, Parser)]
#[command(name = "storyteller", version)]
pub struct Cli {
    /// PDF document to analyze.
    pub document: PathBuf,

    /// Number of pages the backend should analyze; anything that is not a
    /// positive integer falls back to 3.
    #[arg(long, default_value = "3")]
    pub pages: String,

    /// API root; endpoints live under `{api_url}/api/`.
    #[arg(long, env = API_URL_ENV, default_value = DEFAULT_API_URL)]
    pub api_url: String,

    #[arg(long, default_value_t = 2000)]
    pub poll_interval_ms: u64,

    /// Write the fetched artifacts and a manifest here.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Also write logs to this file.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, short)]
    pub verbose: bool,
}

impl Cli {
    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings::with_base_url(self.api_url.clone())
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            poll_interval: Duration::from_millis(self.poll_interval_ms.max(1)),
            ..MonitorSettings::default()
        }
    }
}

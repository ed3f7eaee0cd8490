use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::filename::artifact_filename;
use crate::persist::{ArtifactDir, PersistError};
use crate::{AssembledResults, ChartOutcome, NarrativeOutcome};

const MANIFEST_FILENAME: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub narrative_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
    pub manifest_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

#[derive(Serialize)]
struct Manifest<'a> {
    job_id: &'a str,
    narrative: ManifestEntry<'a>,
    chart: ManifestEntry<'a>,
}

#[derive(Serialize)]
struct ManifestEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    download_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> ManifestEntry<'a> {
    fn named(name: &'a str) -> Self {
        Self {
            name,
            file: None,
            url: None,
            download_url: None,
            error: None,
        }
    }
}

/// Write every artifact that was fetched, plus a manifest describing both,
/// into `output_dir`.
pub fn export_artifacts(
    output_dir: &Path,
    job_id: &str,
    results: &AssembledResults,
) -> Result<ExportSummary, ExportError> {
    let dir = ArtifactDir::open(output_dir)?;
    let mut taken = vec![MANIFEST_FILENAME.to_string()];

    let (narrative_path, narrative) = match &results.narrative {
        NarrativeOutcome::Loaded { name, text } => {
            let path = dir.write_bytes(&claim_filename(name, &mut taken), text.as_bytes())?;
            let entry = ManifestEntry {
                file: Some(file_name(&path)),
                ..ManifestEntry::named(name)
            };
            (Some(path), entry)
        }
        NarrativeOutcome::Failed {
            name,
            reason,
            download_url,
        } => (
            None,
            ManifestEntry {
                download_url: Some(download_url.as_str()),
                error: Some(reason.as_str()),
                ..ManifestEntry::named(name)
            },
        ),
    };

    let (chart_path, chart) = match &results.chart {
        ChartOutcome::Available { name, url, bytes } => {
            let path = dir.write_bytes(&claim_filename(name, &mut taken), bytes)?;
            let entry = ManifestEntry {
                file: Some(file_name(&path)),
                url: Some(url.as_str()),
                ..ManifestEntry::named(name)
            };
            (Some(path), entry)
        }
        ChartOutcome::Unavailable { name, reason } => (
            None,
            ManifestEntry {
                error: Some(reason.as_str()),
                ..ManifestEntry::named(name)
            },
        ),
    };

    let manifest_path = dir.write_json(
        MANIFEST_FILENAME,
        &Manifest {
            job_id,
            narrative,
            chart,
        },
    )?;

    Ok(ExportSummary {
        narrative_path,
        chart_path,
        manifest_path,
    })
}

/// Safe file name for `name` that no earlier artifact in this export uses.
/// Collisions get a numeric suffix before the extension: `report-2.txt`.
fn claim_filename(name: &str, taken: &mut Vec<String>) -> String {
    let base = artifact_filename(name);
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, extension)) if !stem.is_empty() => (stem, format!(".{extension}")),
        _ => (base.as_str(), String::new()),
    };
    let mut candidate = base.clone();
    let mut n = 2;
    // Case-insensitive filesystems would still collide.
    while taken.iter().any(|used| used.eq_ignore_ascii_case(&candidate)) {
        candidate = format!("{stem}-{n}{extension}");
        n += 1;
    }
    taken.push(candidate.clone());
    candidate
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

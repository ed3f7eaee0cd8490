use storyteller_logging::{monitor_debug, monitor_info, monitor_warn};

use crate::decode::decode_text;
use crate::{AssembledResults, Backend, ChartOutcome, NarrativeOutcome, TransportError};

/// Fetch the artifact names of a completed job, then both artifacts.
///
/// Only the metadata fetch can fail the whole assembly; each artifact failure
/// is folded into its own outcome.
pub async fn assemble_results(
    backend: &dyn Backend,
    job_id: &str,
) -> Result<AssembledResults, TransportError> {
    let names = backend.results(job_id).await?;
    monitor_info!(
        "job {} produced narrative {} and chart {}",
        job_id,
        names.narrative,
        names.sankey
    );

    let (narrative, chart) = tokio::join!(
        backend.fetch_artifact(&names.narrative),
        backend.fetch_artifact(&names.sankey)
    );

    let narrative_failed = |reason: String| {
        monitor_warn!("narrative {} unavailable: {}", names.narrative, reason);
        NarrativeOutcome::Failed {
            name: names.narrative.clone(),
            reason,
            download_url: backend.artifact_url(&names.narrative),
        }
    };
    let narrative = match narrative {
        Ok(artifact) => match decode_text(&artifact.bytes, artifact.content_type.as_deref()) {
            Ok(decoded) => {
                monitor_debug!("narrative {} decoded as {}", artifact.name, decoded.encoding_label);
                NarrativeOutcome::Loaded {
                    name: artifact.name,
                    text: decoded.text,
                }
            }
            Err(err) => narrative_failed(err.to_string()),
        },
        Err(err) => narrative_failed(err.to_string()),
    };

    let chart = match chart {
        Ok(artifact) => ChartOutcome::Available {
            url: backend.artifact_url(&artifact.name),
            name: artifact.name,
            bytes: artifact.bytes,
        },
        Err(err) => {
            monitor_warn!("chart {} unavailable: {}", names.sankey, err);
            ChartOutcome::Unavailable {
                name: names.sankey.clone(),
                reason: err.to_string(),
            }
        }
    };

    Ok(AssembledResults { narrative, chart })
}

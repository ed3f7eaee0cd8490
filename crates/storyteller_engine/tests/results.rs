mod common;

use bytes::Bytes;
use common::{network_error, text_artifact, ScriptedBackend};
use pretty_assertions::assert_eq;
use storyteller_engine::{
    assemble_results, Artifact, ChartOutcome, FailureKind, NarrativeOutcome, ResultNames,
    TransportError,
};

fn names() -> Result<ResultNames, TransportError> {
    Ok(ResultNames {
        narrative: "n.txt".into(),
        sankey: "s.html".into(),
    })
}

fn html(name: &str) -> Result<Artifact, TransportError> {
    Ok(Artifact {
        name: name.into(),
        bytes: Bytes::from_static(b"<html>sankey</html>"),
        content_type: Some("text/html".into()),
    })
}

#[tokio::test]
async fn both_artifacts_loaded() {
    common::init_logging();
    let backend = ScriptedBackend::new()
        .with_results(names())
        .with_artifact("n.txt", text_artifact("n.txt", "Revenue grew 12%."))
        .with_artifact("s.html", html("s.html"));

    let results = assemble_results(&backend, "j1").await.unwrap();

    assert_eq!(
        results.narrative,
        NarrativeOutcome::Loaded {
            name: "n.txt".into(),
            text: "Revenue grew 12%.".into(),
        }
    );
    assert_eq!(
        results.chart,
        ChartOutcome::Available {
            name: "s.html".into(),
            url: "http://backend.test/api/download/s.html".into(),
            bytes: Bytes::from_static(b"<html>sankey</html>"),
        }
    );
    let calls = backend.calls();
    assert_eq!(calls[0], "results:j1");
    assert!(calls.contains(&"download:n.txt".to_string()));
    assert!(calls.contains(&"download:s.html".to_string()));
}

#[tokio::test]
async fn narrative_failure_keeps_the_chart() {
    let backend = ScriptedBackend::new()
        .with_results(names())
        .with_artifact("n.txt", Err(network_error("connection reset")))
        .with_artifact("s.html", html("s.html"));

    let results = assemble_results(&backend, "j1").await.unwrap();

    assert_eq!(
        results.narrative,
        NarrativeOutcome::Failed {
            name: "n.txt".into(),
            reason: "network error: connection reset".into(),
            download_url: "http://backend.test/api/download/n.txt".into(),
        }
    );
    assert!(matches!(results.chart, ChartOutcome::Available { .. }));
}

#[tokio::test]
async fn chart_failure_keeps_the_narrative() {
    let backend = ScriptedBackend::new()
        .with_results(names())
        .with_artifact("n.txt", text_artifact("n.txt", "Costs fell."));

    let results = assemble_results(&backend, "j1").await.unwrap();

    assert!(matches!(results.narrative, NarrativeOutcome::Loaded { .. }));
    assert_eq!(
        results.chart,
        ChartOutcome::Unavailable {
            name: "s.html".into(),
            reason: "http status 404: Not Found".into(),
        }
    );
}

#[tokio::test]
async fn metadata_failure_fetches_no_artifacts() {
    let backend = ScriptedBackend::new().with_results(Err(TransportError::new(
        FailureKind::Backend,
        "job expired",
    )));

    let err = assemble_results(&backend, "j1").await.unwrap_err();

    assert_eq!(err.to_string(), "job expired");
    assert_eq!(backend.calls(), vec!["results:j1"]);
}

#[tokio::test]
async fn narrative_honours_declared_charset() {
    let backend = ScriptedBackend::new()
        .with_results(names())
        .with_artifact(
            "n.txt",
            Ok(Artifact {
                name: "n.txt".into(),
                bytes: Bytes::from_static(&[0x55, 0x6d, 0x73, 0xe4, 0x74, 0x7a]),
                content_type: Some("text/plain; charset=iso-8859-1".into()),
            }),
        )
        .with_artifact("s.html", html("s.html"));

    let results = assemble_results(&backend, "j1").await.unwrap();

    assert_eq!(
        results.narrative,
        NarrativeOutcome::Loaded {
            name: "n.txt".into(),
            text: "Ums\u{e4}tz".into(),
        }
    );
}

#[tokio::test]
async fn undecodable_narrative_falls_back_to_download_link() {
    let backend = ScriptedBackend::new()
        .with_results(names())
        .with_artifact(
            "n.txt",
            Ok(Artifact {
                name: "n.txt".into(),
                bytes: Bytes::from_static(&[0x66, 0xff, 0xfe, 0x6f]),
                content_type: Some("text/plain; charset=utf-8".into()),
            }),
        )
        .with_artifact("s.html", html("s.html"));

    let results = assemble_results(&backend, "j1").await.unwrap();

    match results.narrative {
        NarrativeOutcome::Failed {
            reason,
            download_url,
            ..
        } => {
            assert!(reason.starts_with("failed to decode narrative"));
            assert_eq!(download_url, "http://backend.test/api/download/n.txt");
        }
        other => panic!("expected a failed narrative, got {other:?}"),
    }
}

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{CollectingSink, ScriptedBackend};
use pretty_assertions::assert_eq;
use storyteller_engine::LogStreamCoordinator;
use tokio_util::sync::CancellationToken;

async fn wait_for_call(backend: &ScriptedBackend, call: &str) {
    for _ in 0..400 {
        if backend.calls().iter().any(|c| c == call) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("backend never saw {call}");
}

#[tokio::test]
async fn relays_lines_in_arrival_order() {
    common::init_logging();
    let backend = Arc::new(ScriptedBackend::new());
    let tx = backend.add_log_stream();
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();

    let mut logs = LogStreamCoordinator::new();
    logs.open(backend.clone(), 1, "j1", Arc::new(sink.clone()), &parent);
    assert!(logs.is_open());
    assert_eq!(logs.job_id(), Some("j1"));

    for line in ["parsing page 1", "parsing page 2", "building chart"] {
        tx.send(line.to_string()).unwrap();
    }
    assert!(sink.wait_until(|events| events.len() == 3).await);
    assert_eq!(
        sink.log_lines(),
        vec![
            (1, "parsing page 1".to_string()),
            (1, "parsing page 2".to_string()),
            (1, "building chart".to_string()),
        ]
    );
}

#[tokio::test]
async fn reopening_closes_the_previous_subscription() {
    let backend = Arc::new(ScriptedBackend::new());
    let first = backend.add_log_stream();
    let second = backend.add_log_stream();
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();

    let mut logs = LogStreamCoordinator::new();
    logs.open(backend.clone(), 1, "j1", Arc::new(sink.clone()), &parent);
    wait_for_call(&backend, "logs:j1").await;

    logs.open(backend.clone(), 2, "j2", Arc::new(sink.clone()), &parent);
    assert_eq!(logs.job_id(), Some("j2"));
    wait_for_call(&backend, "logs:j2").await;

    let _ = first.send("stale".to_string());
    second.send("fresh".to_string()).unwrap();

    assert!(sink.wait_until(|events| !events.is_empty()).await);
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sink.log_lines(), vec![(2, "fresh".to_string())]);
}

#[tokio::test]
async fn close_is_idempotent() {
    let backend = Arc::new(ScriptedBackend::new());
    let tx = backend.add_log_stream();
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();

    let mut logs = LogStreamCoordinator::new();
    logs.close();
    assert!(!logs.is_open());

    logs.open(backend.clone(), 1, "j1", Arc::new(sink.clone()), &parent);
    wait_for_call(&backend, "logs:j1").await;
    logs.close();
    logs.close();
    assert!(!logs.is_open());
    assert_eq!(logs.job_id(), None);

    let _ = tx.send("after close".to_string());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert!(sink.events().is_empty());
}

#[tokio::test]
async fn parent_cancellation_stops_the_relay() {
    let backend = Arc::new(ScriptedBackend::new());
    let tx = backend.add_log_stream();
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();

    let mut logs = LogStreamCoordinator::new();
    logs.open(backend.clone(), 1, "j1", Arc::new(sink.clone()), &parent);
    tx.send("first".to_string()).unwrap();
    assert!(sink.wait_until(|events| events.len() == 1).await);

    parent.cancel();
    tokio::time::sleep(Duration::from_millis(10)).await;
    let _ = tx.send("second".to_string());
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sink.log_lines(), vec![(1, "first".to_string())]);
}

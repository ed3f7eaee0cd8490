mod common;

use std::sync::Arc;
use std::time::Duration;

use common::CollectingSink;
use pretty_assertions::assert_eq;
use storyteller_engine::{EngineEvent, ProgressTimer};
use tokio_util::sync::CancellationToken;

fn ticks(sink: &CollectingSink) -> usize {
    sink.events()
        .iter()
        .filter(|event| matches!(event, EngineEvent::ProgressTick { session: 3 }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn first_tick_comes_after_one_interval() {
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();
    let timer = ProgressTimer::start(3, Duration::from_millis(500), Arc::new(sink.clone()), &parent);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ticks(&sink), 0);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(ticks(&sink), 1);
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(ticks(&sink), 2);

    timer.stop();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ticks(&sink), 2);
    assert!(!timer.is_running());
}

#[tokio::test(start_paused = true)]
async fn zero_interval_still_ticks() {
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();
    let timer = ProgressTimer::start(3, Duration::ZERO, Arc::new(sink.clone()), &parent);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(timer.is_running());
    assert!(ticks(&sink) >= 1);
}

#[tokio::test(start_paused = true)]
async fn parent_cancellation_stops_the_timer() {
    let sink = CollectingSink::new();
    let parent = CancellationToken::new();
    let timer = ProgressTimer::start(3, Duration::from_millis(100), Arc::new(sink.clone()), &parent);

    parent.cancel();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(ticks(&sink), 0);
    assert!(!timer.is_running());
}

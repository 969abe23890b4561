//! Merged event streams: snapshot ordering, live fan-in, partial-start
//! failures and cancellation
//!
//! Run with: cargo test --test event_stream_test

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use fedgate::{
    BackendError, CancellationToken, CollectingSink, DiagnosticKind, EventStream,
    FederatedGateway, GatewayConfig, GatewayError, TracingSink,
};
use fedgate_core::EventStreamOptions;
use fedgate_memory::StaticRegistry;
use fedgate_tests::{event_at, eventually, gateway_of, ScriptedBackend};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn follow() -> EventStreamOptions {
    EventStreamOptions {
        follow: true,
        ..Default::default()
    }
}

/// Read the next `n` event names, failing the test if they do not arrive
async fn take_names(stream: &mut EventStream, n: usize) -> Vec<String> {
    let mut names = Vec::with_capacity(n);
    for _ in 0..n {
        let event = timeout(WAIT, stream.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended early");
        names.push(event.name);
    }
    names
}

fn two_backends() -> (Arc<ScriptedBackend>, Arc<ScriptedBackend>) {
    let b1 = ScriptedBackend::new("B1")
        .with_history(vec![event_at("e1", 1), event_at("e3", 3), event_at("e5", 5)]);
    let b2 = ScriptedBackend::new("B2").with_history(vec![event_at("e2", 2), event_at("e4", 4)]);
    (Arc::new(b1), Arc::new(b2))
}

// =============================================================================
// Snapshot phase
// =============================================================================

#[tokio::test]
async fn test_snapshot_is_sorted_by_observation_time() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1, b2]);

    let stream = gateway
        .event_stream(
            &EventStreamOptions::default(),
            &CancellationToken::new(),
            Arc::new(TracingSink),
        )
        .await
        .unwrap();

    let names: Vec<String> = timeout(WAIT, stream.map(|e| e.name).collect())
        .await
        .unwrap();
    assert_eq!(names, vec!["e1", "B2/e2", "e3", "B2/e4", "e5"]);
}

#[tokio::test]
async fn test_snapshot_precedes_live_events() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);
    let cancel = CancellationToken::new();

    let mut stream = gateway
        .event_stream(&follow(), &cancel, Arc::new(TracingSink))
        .await
        .unwrap();

    // Live events observed earlier than the snapshot still come after it
    b1.push(event_at("live-b1", 0));
    b2.push(event_at("live-b2", 0));

    let snapshot = take_names(&mut stream, 5).await;
    assert_eq!(snapshot, vec!["e1", "B2/e2", "e3", "B2/e4", "e5"]);

    let mut live = take_names(&mut stream, 2).await;
    live.sort();
    assert_eq!(live, vec!["B2/live-b2", "live-b1"]);

    cancel.cancel();
    timeout(WAIT, stream.join()).await.unwrap();
}

#[tokio::test]
async fn test_equal_timestamps_keep_backend_order() {
    let b1 = Arc::new(ScriptedBackend::new("B1").with_history(vec![event_at("a", 1)]));
    let b2 = Arc::new(ScriptedBackend::new("B2").with_history(vec![event_at("b", 1)]));
    let gateway = gateway_of(vec![b1, b2]);

    let stream = gateway
        .event_stream(
            &EventStreamOptions::default(),
            &CancellationToken::new(),
            Arc::new(TracingSink),
        )
        .await
        .unwrap();
    let names: Vec<String> = timeout(WAIT, stream.map(|e| e.name).collect())
        .await
        .unwrap();
    assert_eq!(names, vec!["a", "B2/b"]);
}

#[tokio::test]
async fn test_snapshot_failure_is_fatal() {
    let (b1, _) = two_backends();
    let b2 = Arc::new(ScriptedBackend::new("B2").failing_history(BackendError::Timeout));
    let gateway = gateway_of(vec![b1.clone(), b2]);

    let err = gateway
        .event_stream(&follow(), &CancellationToken::new(), Arc::new(TracingSink))
        .await
        .err()
        .unwrap();
    assert_eq!(err, GatewayError::Backend(BackendError::Timeout));

    // No live subscription was attempted
    assert!(b1.watch_cursors.lock().is_empty());
}

#[tokio::test]
async fn test_explicit_cursor_skips_listing() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);
    let cancel = CancellationToken::new();

    let opts = EventStreamOptions {
        follow: true,
        resource_version: Some("42".to_string()),
        ..Default::default()
    };
    let mut stream = gateway
        .event_stream(&opts, &cancel, Arc::new(TracingSink))
        .await
        .unwrap();

    assert_eq!(b1.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(b2.list_calls.load(Ordering::SeqCst), 0);
    assert_eq!(*b1.watch_cursors.lock(), vec![Some("42".to_string())]);

    b2.push(event_at("fresh", 9));
    assert_eq!(take_names(&mut stream, 1).await, vec!["B2/fresh"]);
    stream.shutdown().await;
}

#[tokio::test]
async fn test_watch_starts_from_listing_cursor() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);

    let stream = gateway
        .event_stream(&follow(), &CancellationToken::new(), Arc::new(TracingSink))
        .await
        .unwrap();

    assert_eq!(*b1.watch_cursors.lock(), vec![Some("B1-rv".to_string())]);
    assert_eq!(*b2.watch_cursors.lock(), vec![Some("B2-rv".to_string())]);
    stream.shutdown().await;
}

#[rstest]
#[case::cursor_from_listing(None, None)]
#[case::cursor_from_caller(Some("42"), Some(3))]
#[tokio::test]
async fn test_tail_only_bounds_caller_cursor_watches(
    #[case] cursor: Option<&str>,
    #[case] expected_tail: Option<usize>,
) {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2]);

    let opts = EventStreamOptions {
        follow: true,
        tail: Some(3),
        resource_version: cursor.map(str::to_string),
        ..Default::default()
    };
    let stream = gateway
        .event_stream(&opts, &CancellationToken::new(), Arc::new(TracingSink))
        .await
        .unwrap();

    assert_eq!(*b1.watch_tails.lock(), vec![expected_tail]);
    stream.shutdown().await;
}

// =============================================================================
// Live phase
// =============================================================================

#[tokio::test]
async fn test_failed_subscription_leaves_other_backends_running() {
    let b1 = Arc::new(ScriptedBackend::new("B1"));
    let b2 = Arc::new(
        ScriptedBackend::new("B2").failing_watch(BackendError::Transport("refused".into())),
    );
    let gateway = gateway_of(vec![b1.clone(), b2]);
    let sink = CollectingSink::new();
    let cancel = CancellationToken::new();

    let mut stream = gateway
        .event_stream(&follow(), &cancel, Arc::new(sink.clone()))
        .await
        .unwrap();

    b1.push(event_at("still-here", 1));
    assert_eq!(take_names(&mut stream, 1).await, vec!["still-here"]);

    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].scope, "B2");
    assert_eq!(diagnostics[0].kind, DiagnosticKind::SubscribeFailed);
    assert_eq!(
        diagnostics[0].error,
        BackendError::Transport("refused".into())
    );

    cancel.cancel();
    timeout(WAIT, stream.join()).await.unwrap();
}

#[tokio::test]
async fn test_feed_error_ends_only_that_feed() {
    let b1 = Arc::new(ScriptedBackend::new("B1"));
    let b2 = Arc::new(ScriptedBackend::new("B2"));
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);
    let sink = CollectingSink::new();

    let mut stream = gateway
        .event_stream(&follow(), &CancellationToken::new(), Arc::new(sink.clone()))
        .await
        .unwrap();

    b2.push_error(BackendError::Transport("reset".into()));
    b1.push(event_at("after", 1));
    assert_eq!(take_names(&mut stream, 1).await, vec!["after"]);

    assert!(eventually(WAIT, || !sink.diagnostics().is_empty()).await);
    let diagnostics = sink.diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::FeedFailed);
    stream.shutdown().await;
}

#[tokio::test]
async fn test_stream_ends_when_every_feed_ends() {
    let b1 = Arc::new(ScriptedBackend::new("B1"));
    let b2 = Arc::new(ScriptedBackend::new("B2"));
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);

    let mut stream = gateway
        .event_stream(&follow(), &CancellationToken::new(), Arc::new(TracingSink))
        .await
        .unwrap();

    b1.push(event_at("last", 1));
    b1.close();
    b2.close();

    assert_eq!(take_names(&mut stream, 1).await, vec!["last"]);
    assert_eq!(timeout(WAIT, stream.next()).await.unwrap(), None);
    timeout(WAIT, stream.join()).await.unwrap();
}

#[tokio::test]
async fn test_without_follow_no_watch_is_started() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2.clone()]);

    let stream = gateway
        .event_stream(
            &EventStreamOptions::default(),
            &CancellationToken::new(),
            Arc::new(TracingSink),
        )
        .await
        .unwrap();
    let count = timeout(WAIT, stream.count()).await.unwrap();

    assert_eq!(count, 5);
    assert!(b1.watch_cursors.lock().is_empty());
    assert!(b2.watch_cursors.lock().is_empty());
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn test_cancel_during_snapshot_delivery() {
    let (b1, b2) = two_backends();
    let registry = StaticRegistry::new("B1").with_backend(b1).with_backend(b2);
    let gateway =
        FederatedGateway::with_config(Arc::new(registry), GatewayConfig { event_buffer: 1 })
            .unwrap();
    let cancel = CancellationToken::new();

    let mut stream = gateway
        .event_stream(&follow(), &cancel, Arc::new(TracingSink))
        .await
        .unwrap();

    assert_eq!(take_names(&mut stream, 1).await, vec!["e1"]);
    cancel.cancel();

    // Nothing more is delivered, even though events are still buffered
    assert_eq!(timeout(WAIT, stream.next()).await.unwrap(), None);
    timeout(WAIT, stream.join())
        .await
        .expect("driver did not exit after cancellation");
}

#[tokio::test]
async fn test_cancel_while_waiting_for_snapshot() {
    let b1 = Arc::new(ScriptedBackend::new("B1"));
    let b2 = Arc::new(ScriptedBackend::new("B2").hanging_history());
    let gateway = gateway_of(vec![b1, b2]);
    let cancel = CancellationToken::new();

    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let result = timeout(
        WAIT,
        gateway.event_stream(&follow(), &cancel, Arc::new(TracingSink)),
    )
    .await
    .expect("event_stream did not observe cancellation");
    assert!(result.err().unwrap().is_cancelled());
}

#[tokio::test]
async fn test_dropping_stream_cancels_producers() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1.clone(), b2]);
    let cancel = CancellationToken::new();

    let stream = gateway
        .event_stream(&follow(), &cancel, Arc::new(TracingSink))
        .await
        .unwrap();
    assert!(!b1.watcher_gone());
    drop(stream);

    assert!(eventually(WAIT, || b1.watcher_gone()).await);
    // The caller's token is a parent and is left alone
    assert!(!cancel.is_cancelled());
}

#[tokio::test]
async fn test_parent_token_cancels_stream() {
    let (b1, b2) = two_backends();
    let gateway = gateway_of(vec![b1, b2]);
    let cancel = CancellationToken::new();

    let stream = gateway
        .event_stream(&follow(), &cancel, Arc::new(TracingSink))
        .await
        .unwrap();
    cancel.cancel();

    assert!(stream.is_cancelled());
    let remaining = timeout(WAIT, stream.count()).await.unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_zero_event_buffer_is_rejected() {
    let registry = StaticRegistry::new("B1");
    let err = FederatedGateway::with_config(Arc::new(registry), GatewayConfig { event_buffer: 0 })
        .err()
        .unwrap();
    assert!(matches!(err, GatewayError::Config(_)));
}

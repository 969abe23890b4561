//! Event stream merging across backends.
//!
//! Two phases:
//! 1. **Snapshot**: every backend lists its historical events concurrently.
//!    Any failure aborts the call. The union is sorted by observation time
//!    and delivered first.
//! 2. **Live** (follow mode only): every backend is watched from the cursor
//!    its listing returned. A watch that fails to start is reported to the
//!    [`DiagnosticSink`] and that backend is left out; the others carry on.
//!
//! One [`CancellationToken`] governs both phases. Every blocking point
//! (backend I/O, channel sends, waiting on a feed) selects against it.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use fedgate_core::scoped::scope_identifier;
use fedgate_core::{Backend, BackendResult, Event, EventFeed, EventStreamOptions, Scoped};
use futures::future::{join_all, try_join_all};
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::FederatedGateway;

/// Historical events of one backend and the cursor to watch from
struct Snapshot {
    cursor: Option<String>,
    items: Vec<Event>,
}

/// A started live subscription
struct LiveFeed {
    scope: String,
    /// Scope to prefix event names with; `None` for the default backend
    prefix: Option<String>,
    feed: EventFeed,
}

impl FederatedGateway {
    /// Merge historical and (optionally) live events from every backend.
    ///
    /// Returns once every snapshot has been fetched; delivery then runs on
    /// a driver task owned by the returned [`EventStream`]. Cancelling
    /// `cancel` (or dropping the stream) stops every producer promptly.
    pub async fn event_stream(
        &self,
        opts: &EventStreamOptions,
        cancel: &CancellationToken,
        sink: Arc<dyn DiagnosticSink>,
    ) -> GatewayResult<EventStream> {
        let cancel = cancel.child_token();
        let backends = self.list_backends().await?;

        let snapshots = backends.iter().map(|backend| take_snapshot(backend, opts));
        let snapshots = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            snapshots = try_join_all(snapshots) => snapshots?,
        };

        let mut initial = Vec::new();
        let mut cursors = Vec::with_capacity(backends.len());
        for (backend, snapshot) in backends.iter().zip(snapshots) {
            let mut items = snapshot.items;
            if let Some(scope) = self.foreign_scope(backend.as_ref()) {
                items.apply_scope(scope);
            }
            initial.extend(items);
            cursors.push(snapshot.cursor);
        }
        // Stable, so equal timestamps keep per-backend order
        initial.sort_by_key(|event| event.observed);

        let feeds = if opts.follow {
            let starts = backends
                .iter()
                .zip(cursors)
                .map(|(backend, cursor)| start_watch(backend, opts, cursor));
            let started = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
                started = join_all(starts) => started,
            };

            let mut feeds = Vec::new();
            for (backend, result) in backends.iter().zip(started) {
                match result {
                    Ok(feed) => feeds.push(LiveFeed {
                        scope: backend.scope_id().to_string(),
                        prefix: self.foreign_scope(backend.as_ref()).map(str::to_string),
                        feed,
                    }),
                    Err(error) => sink.report(Diagnostic {
                        scope: backend.scope_id().to_string(),
                        kind: DiagnosticKind::SubscribeFailed,
                        error,
                    }),
                }
            }
            feeds
        } else {
            Vec::new()
        };

        info!(
            backends = backends.len(),
            snapshot = initial.len(),
            live = feeds.len(),
            "Starting merged event stream"
        );

        let (tx, rx) = mpsc::channel(self.config().event_buffer);
        let driver = tokio::spawn(drive(initial, feeds, tx, cancel.clone(), sink));
        Ok(EventStream::new(rx, cancel, driver))
    }
}

async fn take_snapshot(
    backend: &Arc<dyn Backend>,
    opts: &EventStreamOptions,
) -> BackendResult<Snapshot> {
    // An explicit cursor means the caller already has the history
    if let Some(cursor) = &opts.resource_version {
        return Ok(Snapshot {
            cursor: Some(cursor.clone()),
            items: Vec::new(),
        });
    }

    match backend.list_events(opts).await {
        Ok(list) => Ok(Snapshot {
            cursor: Some(list.resource_version),
            items: list.items,
        }),
        Err(e) => {
            warn!(scope = %backend.scope_id(), error = %e, "Failed to list historical events");
            Err(e)
        }
    }
}

async fn start_watch(
    backend: &Arc<dyn Backend>,
    opts: &EventStreamOptions,
    cursor: Option<String>,
) -> BackendResult<EventFeed> {
    // A cursor taken from the listing already accounts for `tail`; the
    // watch must replay everything after it
    let tail = match opts.resource_version {
        Some(_) => opts.tail,
        None => None,
    };
    let watch_opts = EventStreamOptions {
        resource_version: cursor,
        tail,
        ..opts.clone()
    };
    backend.watch_events(&watch_opts).await
}

/// Deliver the snapshot, then forward every live feed until all drain.
async fn drive(
    snapshot: Vec<Event>,
    feeds: Vec<LiveFeed>,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
    sink: Arc<dyn DiagnosticSink>,
) {
    for event in snapshot {
        if !send(&tx, &cancel, event).await {
            debug!("Snapshot delivery stopped");
            return;
        }
    }

    let mut forwarders = JoinSet::new();
    for feed in feeds {
        forwarders.spawn(forward(feed, tx.clone(), cancel.clone(), sink.clone()));
    }
    drop(tx);

    while let Some(joined) = forwarders.join_next().await {
        if let Err(e) = joined {
            if e.is_panic() {
                warn!(error = %e, "Event forwarder panicked");
            }
        }
    }
    debug!("Merged event stream drained");
}

/// Forward one backend's live events into the merged channel
async fn forward(
    mut live: LiveFeed,
    tx: mpsc::Sender<Event>,
    cancel: CancellationToken,
    sink: Arc<dyn DiagnosticSink>,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return,
            next = live.feed.next() => next,
        };

        match next {
            Some(Ok(mut event)) => {
                if let Some(scope) = &live.prefix {
                    scope_identifier(&mut event, scope);
                }
                if !send(&tx, &cancel, event).await {
                    return;
                }
            }
            Some(Err(error)) => {
                sink.report(Diagnostic {
                    scope: live.scope,
                    kind: DiagnosticKind::FeedFailed,
                    error,
                });
                return;
            }
            None => {
                debug!(scope = %live.scope, "Live event feed ended");
                return;
            }
        }
    }
}

/// Send unless cancelled first. `false` means stop producing.
async fn send(tx: &mpsc::Sender<Event>, cancel: &CancellationToken, event: Event) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(event) => sent.is_ok(),
    }
}

/// The merged output of [`FederatedGateway::event_stream`].
///
/// Yields the sorted snapshot, then live events as they arrive. Ends when
/// every producer is done or the call is cancelled; after cancellation no
/// further (even already buffered) events are yielded. Dropping the stream
/// cancels its producers.
pub struct EventStream {
    rx: mpsc::Receiver<Event>,
    cancel: CancellationToken,
    driver: Option<JoinHandle<()>>,
    _guard: DropGuard,
}

impl EventStream {
    fn new(rx: mpsc::Receiver<Event>, cancel: CancellationToken, driver: JoinHandle<()>) -> Self {
        Self {
            rx,
            _guard: cancel.clone().drop_guard(),
            cancel,
            driver: Some(driver),
        }
    }

    /// Wait for the driver task to exit. It exits once every feed has
    /// drained or the call was cancelled; this does not cancel anything.
    pub async fn join(mut self) {
        if let Some(driver) = self.driver.take() {
            if let Err(e) = driver.await {
                if e.is_panic() {
                    warn!(error = %e, "Event stream driver panicked");
                }
            }
        }
    }

    /// Cancel every producer and wait for the driver to exit
    pub async fn shutdown(self) {
        self.cancel.cancel();
        self.join().await;
    }

    /// Whether the stream was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        if self.cancel.is_cancelled() {
            self.rx.close();
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

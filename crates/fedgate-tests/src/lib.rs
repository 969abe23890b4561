//! Integration tests for the federated gateway
//!
//! The tests in `tests/` exercise the gateway against two kinds of backend:
//! - [`ScriptedBackend`] - returns canned data and failures, and lets a
//!   test push live events by hand
//! - `fedgate_memory::MemoryBackend` - the complete in-process backend
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p fedgate-tests
//! ```
//!
//! # Test Structure
//!
//! - `routing_test.rs` - name resolution and single-target dispatch
//! - `aggregate_test.rs` - fan-out listing across backends
//! - `event_stream_test.rs` - snapshot ordering, live fan-in, cancellation
//! - `memory_e2e_test.rs` - full stack against a TOML-configured registry

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fedgate::FederatedGateway;
use fedgate_core::{
    App, Backend, BackendError, BackendResult, Event, EventFeed, EventList, EventStreamOptions,
};
use fedgate_memory::StaticRegistry;
use futures::StreamExt;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

/// Sender half of a scripted live event feed
pub type LiveSender = mpsc::UnboundedSender<BackendResult<Event>>;

/// Event observed `secs` seconds after a fixed epoch
pub fn event_at(name: &str, secs: i64) -> Event {
    Event {
        name: name.to_string(),
        namespace: "default".to_string(),
        event_type: "AppCreate".to_string(),
        actor: "test".to_string(),
        source: format!("app/{}", name),
        severity: Default::default(),
        description: String::new(),
        observed: epoch() + chrono::Duration::seconds(secs),
        resource_version: secs.to_string(),
    }
}

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

pub fn app(name: &str) -> App {
    App {
        name: name.to_string(),
        image: "nginx".to_string(),
        ..Default::default()
    }
}

enum WatchScript {
    /// Hand out the receiver on the first watch
    Feed(Option<mpsc::UnboundedReceiver<BackendResult<Event>>>),
    Fail(BackendError),
}

/// Backend with canned responses, for driving the gateway into
/// specific situations
pub struct ScriptedBackend {
    scope: String,
    apps: Vec<App>,
    app_error: Option<BackendError>,
    history: Vec<Event>,
    history_error: Option<BackendError>,
    history_hangs: bool,
    watch: Mutex<WatchScript>,
    live_tx: Mutex<Option<LiveSender>>,
    /// Number of backend calls of any kind
    pub calls: AtomicUsize,
    /// Number of `list_events` calls
    pub list_calls: AtomicUsize,
    /// Cursor of every `watch_events` call
    pub watch_cursors: Mutex<Vec<Option<String>>>,
    /// `tail` of every `watch_events` call
    pub watch_tails: Mutex<Vec<Option<usize>>>,
}

impl ScriptedBackend {
    pub fn new(scope: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            scope: scope.to_string(),
            apps: Vec::new(),
            app_error: None,
            history: Vec::new(),
            history_error: None,
            history_hangs: false,
            watch: Mutex::new(WatchScript::Feed(Some(rx))),
            live_tx: Mutex::new(Some(tx)),
            calls: AtomicUsize::new(0),
            list_calls: AtomicUsize::new(0),
            watch_cursors: Mutex::new(Vec::new()),
            watch_tails: Mutex::new(Vec::new()),
        }
    }

    pub fn with_apps(mut self, names: &[&str]) -> Self {
        self.apps = names.iter().map(|n| app(n)).collect();
        self
    }

    pub fn failing_apps(mut self, error: BackendError) -> Self {
        self.app_error = Some(error);
        self
    }

    pub fn with_history(mut self, events: Vec<Event>) -> Self {
        self.history = events;
        self
    }

    pub fn failing_history(mut self, error: BackendError) -> Self {
        self.history_error = Some(error);
        self
    }

    /// `list_events` never completes
    pub fn hanging_history(mut self) -> Self {
        self.history_hangs = true;
        self
    }

    pub fn failing_watch(self, error: BackendError) -> Self {
        *self.watch.lock() = WatchScript::Fail(error);
        self
    }

    /// Push a live event to whoever is watching
    pub fn push(&self, event: Event) {
        if let Some(tx) = self.live_tx.lock().as_ref() {
            let _ = tx.send(Ok(event));
        }
    }

    /// Push a feed error to whoever is watching
    pub fn push_error(&self, error: BackendError) {
        if let Some(tx) = self.live_tx.lock().as_ref() {
            let _ = tx.send(Err(error));
        }
    }

    /// End the live feed
    pub fn close(&self) {
        self.live_tx.lock().take();
    }

    /// Whether nobody holds the live feed any more (or it was closed)
    pub fn watcher_gone(&self) -> bool {
        self.live_tx
            .lock()
            .as_ref()
            .map_or(true, |tx| tx.is_closed())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn called(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    fn scope_id(&self) -> &str {
        &self.scope
    }

    fn namespace(&self) -> &str {
        "default"
    }

    async fn app_list(&self) -> BackendResult<Vec<App>> {
        self.called();
        match &self.app_error {
            Some(error) => Err(error.clone()),
            None => Ok(self.apps.clone()),
        }
    }

    async fn app_get(&self, name: &str) -> BackendResult<Option<App>> {
        self.called();
        Ok(self.apps.iter().find(|a| a.name == name).cloned())
    }

    async fn list_events(&self, _opts: &EventStreamOptions) -> BackendResult<EventList> {
        self.called();
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.history_hangs {
            return futures::future::pending().await;
        }
        if let Some(error) = &self.history_error {
            return Err(error.clone());
        }
        Ok(EventList {
            items: self.history.clone(),
            resource_version: format!("{}-rv", self.scope),
        })
    }

    async fn watch_events(&self, opts: &EventStreamOptions) -> BackendResult<EventFeed> {
        self.called();
        self.watch_cursors.lock().push(opts.resource_version.clone());
        self.watch_tails.lock().push(opts.tail);
        match &mut *self.watch.lock() {
            WatchScript::Fail(error) => Err(error.clone()),
            WatchScript::Feed(rx) => match rx.take() {
                Some(rx) => Ok(UnboundedReceiverStream::new(rx).boxed()),
                None => Err(BackendError::Internal("already watched".to_string())),
            },
        }
    }
}

/// Poll `condition` until it holds or `within` elapses
pub async fn eventually(within: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + within;
    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    true
}

/// Gateway over `backends`, the first of which is the default
pub fn gateway_of(backends: Vec<Arc<ScriptedBackend>>) -> FederatedGateway {
    let default_scope = backends
        .first()
        .map(|b| b.scope_id().to_string())
        .unwrap_or_default();
    let registry = StaticRegistry::new(default_scope);
    for backend in backends {
        registry.register(backend);
    }
    FederatedGateway::new(Arc::new(registry))
}

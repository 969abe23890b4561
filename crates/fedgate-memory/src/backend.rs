//! In-memory backend
//!
//! Keeps every resource of one scope in process. Each mutation records an
//! [`Event`] with a monotonically increasing resource version and
//! publishes it to live watchers.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use fedgate_core::{
    App, AppRunOptions, AppUpdateOptions, Backend, BackendError, BackendResult, ComputeClass,
    ContainerReplica, ContainerReplicaListOptions, Credential, Event, EventFeed, EventList,
    EventSeverity, EventStreamOptions, Image, ImageDeleteOptions, Info, LogFeed, LogMessage,
    LogOptions, Project, Region, Secret, Volume, VolumeClass,
};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::ScopeConfig;

const WATCH_CAPACITY: usize = 256;

#[derive(Default)]
struct State {
    apps: BTreeMap<String, App>,
    secrets: BTreeMap<String, Secret>,
    credentials: BTreeMap<String, Credential>,
    volumes: BTreeMap<String, Volume>,
    replicas: BTreeMap<String, ContainerReplica>,
    images: BTreeMap<String, Image>,
    projects: BTreeMap<String, Project>,
    regions: BTreeMap<String, Region>,
    compute_classes: BTreeMap<String, ComputeClass>,
    volume_classes: BTreeMap<String, VolumeClass>,
    logs: BTreeMap<String, Vec<LogMessage>>,
    /// Event history, oldest first
    events: Vec<Event>,
    /// Last assigned resource version
    version: u64,
}

/// A complete backend kept in memory
pub struct MemoryBackend {
    scope: String,
    namespace: String,
    info: Info,
    state: RwLock<State>,
    events_tx: broadcast::Sender<Event>,
    logs_tx: broadcast::Sender<LogMessage>,
    /// Errors forced onto named operations (for exercising failure paths)
    failures: RwLock<HashMap<String, BackendError>>,
}

impl MemoryBackend {
    pub fn new(scope: impl Into<String>, namespace: impl Into<String>) -> Self {
        let (events_tx, _) = broadcast::channel(WATCH_CAPACITY);
        let (logs_tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            scope: scope.into(),
            namespace: namespace.into(),
            info: Info::default(),
            state: RwLock::new(State::default()),
            events_tx,
            logs_tx,
            failures: RwLock::new(HashMap::new()),
        }
    }

    /// Build a backend seeded with the resources of `config`
    pub fn from_config(config: &ScopeConfig) -> Self {
        let mut backend = Self::new(&config.id, &config.namespace);
        backend.info = Info {
            region: config.region.clone(),
            version: config.version.clone(),
            ..Default::default()
        };

        {
            let mut state = backend.state.write();
            for app in &config.apps {
                let mut app = app.clone();
                app.namespace = config.namespace.clone();
                state.apps.insert(app.name.clone(), app);
            }
            for secret in &config.secrets {
                let mut secret = secret.clone();
                secret.namespace = config.namespace.clone();
                secret.keys = secret.data.keys().cloned().collect();
                state.secrets.insert(secret.name.clone(), secret);
            }
            for credential in &config.credentials {
                state
                    .credentials
                    .insert(credential.server_address.clone(), credential.clone());
            }
            for volume in &config.volumes {
                state.volumes.insert(volume.name.clone(), volume.clone());
            }
            for replica in &config.replicas {
                state.replicas.insert(replica.name.clone(), replica.clone());
            }
            for image in &config.images {
                state.images.insert(image.name.clone(), image.clone());
            }
            for project in &config.projects {
                state.projects.insert(project.name.clone(), project.clone());
            }
            for region in &config.regions {
                state.regions.insert(region.name.clone(), region.clone());
            }
            for class in &config.compute_classes {
                state.compute_classes.insert(class.name.clone(), class.clone());
            }
            for class in &config.volume_classes {
                state.volume_classes.insert(class.name.clone(), class.clone());
            }
            let mut events = config.events.clone();
            events.sort_by_key(|e| e.observed);
            for mut event in events {
                state.version += 1;
                event.namespace = config.namespace.clone();
                event.resource_version = state.version.to_string();
                state.events.push(event);
            }
        }

        info!(
            scope = %backend.scope,
            apps = config.apps.len(),
            events = config.events.len(),
            "Created in-memory backend"
        );
        backend
    }

    /// Make the named operation (e.g. `"app_list"`) fail with `error`
    pub fn inject_failure(&self, operation: &str, error: BackendError) {
        self.failures.write().insert(operation.to_string(), error);
    }

    pub fn clear_failure(&self, operation: &str) {
        self.failures.write().remove(operation);
    }

    /// Append an event to the history and publish it to watchers
    pub fn record_event(&self, event_type: &str, source: &str, description: &str) -> Event {
        let event = {
            let mut state = self.state.write();
            state.version += 1;
            let event = Event {
                name: format!("{}-{}", event_type.to_lowercase(), state.version),
                namespace: self.namespace.clone(),
                event_type: event_type.to_string(),
                actor: "fedgate".to_string(),
                source: source.to_string(),
                severity: EventSeverity::Info,
                description: description.to_string(),
                observed: Utc::now(),
                resource_version: state.version.to_string(),
            };
            state.events.push(event.clone());
            event
        };
        debug!(scope = %self.scope, event = %event.name, "Recorded event");
        // No receivers is fine
        let _ = self.events_tx.send(event.clone());
        event
    }

    /// Append a log line for an app and publish it to followers
    pub fn append_log(&self, app: &str, container: &str, line: &str) {
        let message = LogMessage {
            app_name: app.to_string(),
            container_name: container.to_string(),
            line: line.to_string(),
            time: Utc::now(),
        };
        // Publish under the lock; followers subscribe under it too
        let mut state = self.state.write();
        state
            .logs
            .entry(app.to_string())
            .or_default()
            .push(message.clone());
        let _ = self.logs_tx.send(message);
    }

    /// Current resource version
    pub fn resource_version(&self) -> u64 {
        self.state.read().version
    }

    fn check(&self, operation: &str) -> BackendResult<()> {
        match self.failures.read().get(operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

fn parse_cursor(cursor: Option<&str>) -> BackendResult<u64> {
    match cursor {
        None | Some("") => Ok(0),
        Some(rv) => rv
            .parse()
            .map_err(|_| BackendError::InvalidRequest(format!("Invalid resource version: {}", rv))),
    }
}

fn version_of(event: &Event) -> u64 {
    event.resource_version.parse().unwrap_or(0)
}

fn tail<T>(mut items: Vec<T>, n: Option<usize>) -> Vec<T> {
    if let Some(n) = n {
        if items.len() > n {
            items.drain(..items.len() - n);
        }
    }
    items
}

fn without_values(secret: &Secret) -> Secret {
    Secret {
        data: BTreeMap::new(),
        ..secret.clone()
    }
}

fn without_password(credential: &Credential) -> Credential {
    Credential {
        password: None,
        ..credential.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    fn scope_id(&self) -> &str {
        &self.scope
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    // =========================================================================
    // Apps
    // =========================================================================

    async fn app_list(&self) -> BackendResult<Vec<App>> {
        self.check("app_list")?;
        Ok(self.state.read().apps.values().cloned().collect())
    }

    async fn app_get(&self, name: &str) -> BackendResult<Option<App>> {
        self.check("app_get")?;
        Ok(self.state.read().apps.get(name).cloned())
    }

    async fn app_delete(&self, name: &str) -> BackendResult<Option<App>> {
        self.check("app_delete")?;
        let removed = self.state.write().apps.remove(name);
        if removed.is_some() {
            self.record_event("AppDelete", &format!("app/{}", name), "App deleted");
        }
        Ok(removed)
    }

    async fn app_run(&self, image: &str, opts: &AppRunOptions) -> BackendResult<App> {
        self.check("app_run")?;
        let name = if opts.name.is_empty() {
            format!("app-{}", &Uuid::new_v4().simple().to_string()[..8])
        } else {
            opts.name.clone()
        };

        let app = App {
            name: name.clone(),
            namespace: self.namespace.clone(),
            image: image.to_string(),
            labels: opts.labels.clone(),
            created: Some(Utc::now()),
            ..Default::default()
        };
        {
            let mut state = self.state.write();
            if state.apps.contains_key(&name) {
                return Err(BackendError::AlreadyExists(format!("app {}", name)));
            }
            state.apps.insert(name.clone(), app.clone());
        }
        self.record_event("AppCreate", &format!("app/{}", name), image);
        Ok(app)
    }

    async fn app_update(&self, name: &str, opts: &AppUpdateOptions) -> BackendResult<App> {
        self.check("app_update")?;
        let app = {
            let mut state = self.state.write();
            let app = state
                .apps
                .get_mut(name)
                .ok_or_else(|| BackendError::NotFound(format!("app {}", name)))?;
            if let Some(image) = &opts.image {
                if *image != app.image {
                    app.image = image.clone();
                    app.upgrade_pending = true;
                }
            }
            app.labels
                .extend(opts.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
            app.clone()
        };
        self.record_event("AppUpdate", &format!("app/{}", name), "App updated");
        Ok(app)
    }

    async fn app_start(&self, name: &str) -> BackendResult<()> {
        self.check("app_start")?;
        self.set_stopped(name, false)?;
        self.record_event("AppStart", &format!("app/{}", name), "App started");
        Ok(())
    }

    async fn app_stop(&self, name: &str) -> BackendResult<()> {
        self.check("app_stop")?;
        self.set_stopped(name, true)?;
        self.record_event("AppStop", &format!("app/{}", name), "App stopped");
        Ok(())
    }

    async fn app_confirm_upgrade(&self, name: &str) -> BackendResult<()> {
        self.check("app_confirm_upgrade")?;
        {
            let mut state = self.state.write();
            let app = state
                .apps
                .get_mut(name)
                .ok_or_else(|| BackendError::NotFound(format!("app {}", name)))?;
            app.upgrade_pending = false;
        }
        self.record_event("AppUpgrade", &format!("app/{}", name), "Upgrade confirmed");
        Ok(())
    }

    async fn app_pull_image(&self, name: &str) -> BackendResult<()> {
        self.check("app_pull_image")?;
        if !self.state.read().apps.contains_key(name) {
            return Err(BackendError::NotFound(format!("app {}", name)));
        }
        self.record_event("AppPullImage", &format!("app/{}", name), "Image pull requested");
        Ok(())
    }

    /// Drop the app record without tearing down what it created
    async fn app_ignore_delete_cleanup(&self, name: &str) -> BackendResult<()> {
        self.check("app_ignore_delete_cleanup")?;
        if self.state.write().apps.remove(name).is_none() {
            return Err(BackendError::NotFound(format!("app {}", name)));
        }
        self.record_event(
            "AppDelete",
            &format!("app/{}", name),
            "Deleted without cleanup",
        );
        Ok(())
    }

    async fn app_logs(&self, name: &str, opts: &LogOptions) -> BackendResult<LogFeed> {
        self.check("app_logs")?;
        // A line is either in the history or on the subscription, never both
        let (history, live) = {
            let state = self.state.read();
            if !state.apps.contains_key(name) {
                return Err(BackendError::NotFound(format!("app {}", name)));
            }
            (
                state.logs.get(name).cloned().unwrap_or_default(),
                BroadcastStream::new(self.logs_tx.subscribe()),
            )
        };
        let history = stream::iter(tail(history, opts.tail));

        if !opts.follow {
            return Ok(history.boxed());
        }

        let app = name.to_string();
        let live = live.filter_map(move |line| {
            let keep = matches!(&line, Ok(msg) if msg.app_name == app);
            async move { if keep { line.ok() } else { None } }
        });
        Ok(history.chain(live).boxed())
    }

    // =========================================================================
    // Secrets
    // =========================================================================

    async fn secret_create(
        &self,
        name: &str,
        secret_type: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> BackendResult<Secret> {
        self.check("secret_create")?;
        let secret = Secret {
            name: name.to_string(),
            namespace: self.namespace.clone(),
            secret_type: secret_type.to_string(),
            keys: data.keys().cloned().collect(),
            data,
        };
        {
            let mut state = self.state.write();
            if state.secrets.contains_key(name) {
                return Err(BackendError::AlreadyExists(format!("secret {}", name)));
            }
            state.secrets.insert(name.to_string(), secret.clone());
        }
        self.record_event("SecretCreate", &format!("secret/{}", name), "Secret created");
        Ok(secret)
    }

    async fn secret_list(&self) -> BackendResult<Vec<Secret>> {
        self.check("secret_list")?;
        Ok(self.state.read().secrets.values().map(without_values).collect())
    }

    async fn secret_get(&self, name: &str) -> BackendResult<Option<Secret>> {
        self.check("secret_get")?;
        Ok(self.state.read().secrets.get(name).map(without_values))
    }

    async fn secret_reveal(&self, name: &str) -> BackendResult<Option<Secret>> {
        self.check("secret_reveal")?;
        Ok(self.state.read().secrets.get(name).cloned())
    }

    async fn secret_update(
        &self,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> BackendResult<Secret> {
        self.check("secret_update")?;
        let secret = {
            let mut state = self.state.write();
            let secret = state
                .secrets
                .get_mut(name)
                .ok_or_else(|| BackendError::NotFound(format!("secret {}", name)))?;
            secret.keys = data.keys().cloned().collect();
            secret.data = data;
            secret.clone()
        };
        self.record_event("SecretUpdate", &format!("secret/{}", name), "Secret updated");
        Ok(secret)
    }

    async fn secret_delete(&self, name: &str) -> BackendResult<Option<Secret>> {
        self.check("secret_delete")?;
        let removed = self.state.write().secrets.remove(name);
        if removed.is_some() {
            self.record_event("SecretDelete", &format!("secret/{}", name), "Secret deleted");
        }
        Ok(removed.as_ref().map(without_values))
    }

    // =========================================================================
    // Registry credentials
    // =========================================================================

    async fn credential_create(
        &self,
        server_address: &str,
        username: &str,
        password: &str,
    ) -> BackendResult<Credential> {
        self.check("credential_create")?;
        let credential = Credential {
            server_address: server_address.to_string(),
            namespace: self.namespace.clone(),
            username: username.to_string(),
            password: Some(password.to_string()),
        };
        let mut state = self.state.write();
        if state.credentials.contains_key(server_address) {
            return Err(BackendError::AlreadyExists(format!(
                "credential {}",
                server_address
            )));
        }
        state
            .credentials
            .insert(server_address.to_string(), credential.clone());
        Ok(without_password(&credential))
    }

    async fn credential_list(&self) -> BackendResult<Vec<Credential>> {
        self.check("credential_list")?;
        Ok(self
            .state
            .read()
            .credentials
            .values()
            .map(without_password)
            .collect())
    }

    async fn credential_get(&self, server_address: &str) -> BackendResult<Option<Credential>> {
        self.check("credential_get")?;
        Ok(self
            .state
            .read()
            .credentials
            .get(server_address)
            .map(without_password))
    }

    async fn credential_update(
        &self,
        server_address: &str,
        username: &str,
        password: &str,
    ) -> BackendResult<Credential> {
        self.check("credential_update")?;
        let mut state = self.state.write();
        let credential = state
            .credentials
            .get_mut(server_address)
            .ok_or_else(|| BackendError::NotFound(format!("credential {}", server_address)))?;
        credential.username = username.to_string();
        credential.password = Some(password.to_string());
        Ok(without_password(credential))
    }

    async fn credential_delete(&self, server_address: &str) -> BackendResult<Option<Credential>> {
        self.check("credential_delete")?;
        Ok(self
            .state
            .write()
            .credentials
            .remove(server_address)
            .as_ref()
            .map(without_password))
    }

    // =========================================================================
    // Volumes and container replicas
    // =========================================================================

    async fn volume_list(&self) -> BackendResult<Vec<Volume>> {
        self.check("volume_list")?;
        Ok(self.state.read().volumes.values().cloned().collect())
    }

    async fn volume_get(&self, name: &str) -> BackendResult<Option<Volume>> {
        self.check("volume_get")?;
        Ok(self.state.read().volumes.get(name).cloned())
    }

    async fn volume_delete(&self, name: &str) -> BackendResult<Option<Volume>> {
        self.check("volume_delete")?;
        let removed = self.state.write().volumes.remove(name);
        if removed.is_some() {
            self.record_event("VolumeDelete", &format!("volume/{}", name), "Volume deleted");
        }
        Ok(removed)
    }

    async fn container_replica_list(
        &self,
        opts: &ContainerReplicaListOptions,
    ) -> BackendResult<Vec<ContainerReplica>> {
        self.check("container_replica_list")?;
        Ok(self
            .state
            .read()
            .replicas
            .values()
            .filter(|r| opts.app.as_deref().map_or(true, |app| r.app_name == app))
            .cloned()
            .collect())
    }

    async fn container_replica_get(&self, name: &str) -> BackendResult<Option<ContainerReplica>> {
        self.check("container_replica_get")?;
        Ok(self.state.read().replicas.get(name).cloned())
    }

    async fn container_replica_delete(
        &self,
        name: &str,
    ) -> BackendResult<Option<ContainerReplica>> {
        self.check("container_replica_delete")?;
        Ok(self.state.write().replicas.remove(name))
    }

    // =========================================================================
    // Images
    // =========================================================================

    async fn image_list(&self) -> BackendResult<Vec<Image>> {
        self.check("image_list")?;
        Ok(self.state.read().images.values().cloned().collect())
    }

    /// Look up by ID or by any tag
    async fn image_get(&self, name: &str) -> BackendResult<Option<Image>> {
        self.check("image_get")?;
        let state = self.state.read();
        Ok(state.images.get(name).cloned().or_else(|| {
            state
                .images
                .values()
                .find(|image| image.tags.iter().any(|t| t == name))
                .cloned()
        }))
    }

    async fn image_delete(
        &self,
        name: &str,
        opts: &ImageDeleteOptions,
    ) -> BackendResult<Option<Image>> {
        self.check("image_delete")?;
        let removed = {
            let mut state = self.state.write();
            let Some(id) = state
                .images
                .values()
                .find(|image| image.name == name || image.tags.iter().any(|t| t == name))
                .map(|image| image.name.clone())
            else {
                return Ok(None);
            };
            let image = &state.images[&id];
            if !opts.force {
                if let Some(app) = state
                    .apps
                    .values()
                    .find(|app| app.image == image.name || image.tags.contains(&app.image))
                {
                    return Err(BackendError::InvalidRequest(format!(
                        "image {} is in use by app {}",
                        name, app.name
                    )));
                }
            }
            state.images.remove(&id)
        };
        if let Some(image) = &removed {
            self.record_event("ImageDelete", &format!("image/{}", image.name), "Image deleted");
        }
        Ok(removed)
    }

    // =========================================================================
    // Projects
    // =========================================================================

    async fn project_list(&self) -> BackendResult<Vec<Project>> {
        self.check("project_list")?;
        Ok(self.state.read().projects.values().cloned().collect())
    }

    async fn project_get(&self, name: &str) -> BackendResult<Option<Project>> {
        self.check("project_get")?;
        Ok(self.state.read().projects.get(name).cloned())
    }

    // =========================================================================
    // Regions and classes
    // =========================================================================

    async fn region_list(&self) -> BackendResult<Vec<Region>> {
        self.check("region_list")?;
        Ok(self.state.read().regions.values().cloned().collect())
    }

    async fn region_get(&self, name: &str) -> BackendResult<Option<Region>> {
        self.check("region_get")?;
        Ok(self.state.read().regions.get(name).cloned())
    }

    async fn compute_class_list(&self) -> BackendResult<Vec<ComputeClass>> {
        self.check("compute_class_list")?;
        Ok(self.state.read().compute_classes.values().cloned().collect())
    }

    async fn compute_class_get(&self, name: &str) -> BackendResult<Option<ComputeClass>> {
        self.check("compute_class_get")?;
        Ok(self.state.read().compute_classes.get(name).cloned())
    }

    async fn volume_class_list(&self) -> BackendResult<Vec<VolumeClass>> {
        self.check("volume_class_list")?;
        Ok(self.state.read().volume_classes.values().cloned().collect())
    }

    async fn volume_class_get(&self, name: &str) -> BackendResult<Option<VolumeClass>> {
        self.check("volume_class_get")?;
        Ok(self.state.read().volume_classes.get(name).cloned())
    }

    // =========================================================================
    // Info
    // =========================================================================

    async fn info(&self) -> BackendResult<Vec<Info>> {
        self.check("info")?;
        Ok(vec![self.info.clone()])
    }

    // =========================================================================
    // Events
    // =========================================================================

    async fn list_events(&self, opts: &EventStreamOptions) -> BackendResult<EventList> {
        self.check("list_events")?;
        let state = self.state.read();
        let items = state
            .events
            .iter()
            .filter(|e| opts.matches(e))
            .cloned()
            .collect();
        Ok(EventList {
            items: tail(items, opts.tail),
            resource_version: state.version.to_string(),
        })
    }

    async fn watch_events(&self, opts: &EventStreamOptions) -> BackendResult<EventFeed> {
        self.check("watch_events")?;
        let cursor = parse_cursor(opts.resource_version.as_deref())?;

        // Subscribe before reading history so nothing falls in between
        let live = BroadcastStream::new(self.events_tx.subscribe());
        let (backlog, floor) = {
            let state = self.state.read();
            let backlog: Vec<Event> = state
                .events
                .iter()
                .filter(|e| version_of(e) > cursor && opts.matches(e))
                .cloned()
                .collect();
            (tail(backlog, opts.tail), cursor.max(state.version))
        };

        let filter = opts.clone();
        let live = live.filter_map(move |item| {
            let item = match item {
                Ok(event) if version_of(&event) > floor && filter.matches(&event) => {
                    Some(Ok(event))
                }
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(n)) => Some(Err(BackendError::Transport(
                    format!("event watch lagged by {} events", n),
                ))),
            };
            async move { item }
        });

        debug!(scope = %self.scope, cursor, backlog = backlog.len(), "Starting event watch");
        Ok(stream::iter(backlog.into_iter().map(Ok)).chain(live).boxed())
    }
}

impl MemoryBackend {
    fn set_stopped(&self, name: &str, stopped: bool) -> BackendResult<()> {
        let mut state = self.state.write();
        let app = state
            .apps
            .get_mut(name)
            .ok_or_else(|| BackendError::NotFound(format!("app {}", name)))?;
        app.stopped = stopped;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn backend() -> MemoryBackend {
        MemoryBackend::new("acme/eu", "ns")
    }

    #[tokio::test]
    async fn run_get_delete_app() {
        let b = backend();
        let opts = AppRunOptions {
            name: "web".into(),
            ..Default::default()
        };
        let app = b.app_run("nginx", &opts).await.unwrap();
        assert_eq!(app.name, "web");
        assert_eq!(app.namespace, "ns");

        assert!(matches!(
            b.app_run("nginx", &opts).await,
            Err(BackendError::AlreadyExists(_))
        ));
        assert_eq!(b.app_get("web").await.unwrap().unwrap().image, "nginx");
        assert!(b.app_delete("web").await.unwrap().is_some());
        assert!(b.app_delete("web").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn run_without_name_generates_one() {
        let app = backend()
            .app_run("nginx", &AppRunOptions::default())
            .await
            .unwrap();
        assert!(app.name.starts_with("app-"));
        assert_eq!(app.name.len(), "app-".len() + 8);
    }

    #[tokio::test]
    async fn update_marks_upgrade_pending_until_confirmed() {
        let b = backend();
        b.app_run(
            "nginx:1",
            &AppRunOptions {
                name: "web".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let updated = b
            .app_update(
                "web",
                &AppUpdateOptions {
                    image: Some("nginx:2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.upgrade_pending);

        b.app_confirm_upgrade("web").await.unwrap();
        assert!(!b.app_get("web").await.unwrap().unwrap().upgrade_pending);
    }

    #[tokio::test]
    async fn stop_unknown_app_is_not_found() {
        assert!(backend().app_stop("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn secret_values_only_on_reveal() {
        let b = backend();
        let data = BTreeMap::from([("token".to_string(), b"s3cr3t".to_vec())]);
        b.secret_create("api", "opaque", data).await.unwrap();

        let hidden = b.secret_get("api").await.unwrap().unwrap();
        assert_eq!(hidden.keys, vec!["token"]);
        assert!(hidden.data.is_empty());

        let revealed = b.secret_reveal("api").await.unwrap().unwrap();
        assert_eq!(revealed.data["token"], b"s3cr3t".to_vec());
    }

    #[tokio::test]
    async fn credentials_never_return_passwords() {
        let b = backend();
        let created = b
            .credential_create("ghcr.io", "me", "pw")
            .await
            .unwrap();
        assert_eq!(created.password, None);
        assert_eq!(b.credential_list().await.unwrap()[0].username, "me");
    }

    #[tokio::test]
    async fn replicas_filter_by_app() {
        let config = ScopeConfig {
            id: "s".into(),
            namespace: "ns".into(),
            replicas: vec![
                ContainerReplica {
                    name: "web-1".into(),
                    app_name: "web".into(),
                    ..Default::default()
                },
                ContainerReplica {
                    name: "db-1".into(),
                    app_name: "db".into(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let b = MemoryBackend::from_config(&config);
        let replicas = b
            .container_replica_list(&ContainerReplicaListOptions {
                app: Some("web".into()),
            })
            .await
            .unwrap();
        assert_eq!(replicas.len(), 1);
        assert_eq!(replicas[0].name, "web-1");
    }

    #[tokio::test]
    async fn image_lookup_by_tag() {
        let config = ScopeConfig {
            id: "s".into(),
            images: vec![Image {
                name: "abc123".into(),
                tags: vec!["web:latest".into()],
                digest: "sha256:abc123".into(),
            }],
            ..Default::default()
        };
        let b = MemoryBackend::from_config(&config);
        assert_eq!(
            b.image_get("web:latest").await.unwrap().unwrap().name,
            "abc123"
        );
        assert!(b.image_get("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn injected_failure_applies_to_one_operation() {
        let b = backend();
        b.inject_failure("app_list", BackendError::Timeout);
        assert_eq!(b.app_list().await.unwrap_err(), BackendError::Timeout);
        assert!(b.volume_list().await.is_ok());
        b.clear_failure("app_list");
        assert!(b.app_list().await.is_ok());
    }

    #[tokio::test]
    async fn list_events_honours_tail_and_cursor() {
        let b = backend();
        b.record_event("AppCreate", "app/a", "");
        b.record_event("AppCreate", "app/b", "");
        b.record_event("AppDelete", "app/a", "");

        let list = b
            .list_events(&EventStreamOptions {
                tail: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(list.items.len(), 2);
        assert_eq!(list.items[1].event_type, "AppDelete");
        assert_eq!(list.resource_version, "3");
        assert_eq!(list.resource_version, b.resource_version().to_string());
    }

    #[tokio::test]
    async fn watch_replays_newer_history_then_live() {
        let b = backend();
        b.record_event("AppCreate", "app/a", "");
        b.record_event("AppCreate", "app/b", "");

        let mut feed = b
            .watch_events(&EventStreamOptions {
                resource_version: Some("1".into()),
                follow: true,
                ..Default::default()
            })
            .await
            .unwrap();
        b.record_event("AppDelete", "app/a", "");

        let first = feed.next().await.unwrap().unwrap();
        let second = feed.next().await.unwrap().unwrap();
        assert_eq!(first.resource_version, "2");
        assert_eq!(second.resource_version, "3");
        assert_eq!(second.event_type, "AppDelete");
    }

    #[tokio::test]
    async fn watch_rejects_bad_cursor() {
        let err = backend()
            .watch_events(&EventStreamOptions {
                resource_version: Some("latest".into()),
                ..Default::default()
            })
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn follow_logs_streams_new_lines() {
        let b = backend();
        b.app_run(
            "nginx",
            &AppRunOptions {
                name: "web".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        b.append_log("web", "nginx", "started");

        let mut logs = b
            .app_logs(
                "web",
                &LogOptions {
                    follow: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        b.append_log("db", "pg", "ignored");
        b.append_log("web", "nginx", "GET /");

        assert_eq!(logs.next().await.unwrap().line, "started");
        assert_eq!(logs.next().await.unwrap().line, "GET /");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn followed_logs_never_repeat_a_line() {
        let b = std::sync::Arc::new(backend());
        b.app_run(
            "nginx",
            &AppRunOptions {
                name: "web".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let writer = {
            let b = b.clone();
            tokio::spawn(async move {
                for i in 0..200 {
                    b.append_log("web", "nginx", &i.to_string());
                    tokio::task::yield_now().await;
                }
            })
        };
        let logs = b
            .app_logs(
                "web",
                &LogOptions {
                    follow: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        writer.await.unwrap();

        let lines: Vec<String> = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            logs.take(200).map(|m| m.line).collect(),
        )
        .await
        .unwrap();
        let expected: Vec<String> = (0..200).map(|i| i.to_string()).collect();
        assert_eq!(lines, expected);
    }

    #[tokio::test]
    async fn ignore_delete_cleanup_drops_the_app() {
        let b = backend();
        b.app_run(
            "nginx",
            &AppRunOptions {
                name: "web".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        b.app_ignore_delete_cleanup("web").await.unwrap();
        assert!(b.app_get("web").await.unwrap().is_none());
        let events = b.list_events(&EventStreamOptions::default()).await.unwrap();
        let last = events.items.last().unwrap();
        assert_eq!(last.event_type, "AppDelete");
        assert_eq!(last.description, "Deleted without cleanup");

        assert!(b
            .app_ignore_delete_cleanup("web")
            .await
            .unwrap_err()
            .is_not_found());
    }

    fn with_image_in_use() -> MemoryBackend {
        MemoryBackend::from_config(&ScopeConfig {
            id: "s".into(),
            apps: vec![App {
                name: "web".into(),
                image: "web:latest".into(),
                ..Default::default()
            }],
            images: vec![
                Image {
                    name: "abc123".into(),
                    tags: vec!["web:latest".into()],
                    digest: "sha256:abc123".into(),
                },
                Image {
                    name: "def456".into(),
                    tags: vec!["old:1".into()],
                    digest: "sha256:def456".into(),
                },
            ],
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn image_in_use_needs_force() {
        let b = with_image_in_use();
        let err = b
            .image_delete("abc123", &ImageDeleteOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(msg) if msg.contains("web")));

        let removed = b
            .image_delete("web:latest", &ImageDeleteOptions { force: true })
            .await
            .unwrap();
        assert_eq!(removed.unwrap().name, "abc123");
        assert!(b.image_get("abc123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unused_image_deletes_by_tag() {
        let b = with_image_in_use();
        let removed = b
            .image_delete("old:1", &ImageDeleteOptions::default())
            .await
            .unwrap();
        assert_eq!(removed.unwrap().name, "def456");
        assert!(b
            .image_delete("old:1", &ImageDeleteOptions::default())
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn projects_regions_and_classes_from_config() {
        let b = MemoryBackend::from_config(&ScopeConfig {
            id: "acme/eu".into(),
            projects: vec![Project {
                name: "eu".into(),
                default_region: "eu-west".into(),
                supported_regions: vec!["eu-west".into()],
            }],
            regions: vec![Region {
                name: "eu-west".into(),
                description: "Europe West".into(),
            }],
            compute_classes: vec![ComputeClass {
                name: "small".into(),
                default: true,
                ..Default::default()
            }],
            volume_classes: vec![VolumeClass {
                name: "ssd".into(),
                ..Default::default()
            }],
            ..Default::default()
        });

        assert_eq!(b.project_list().await.unwrap()[0].default_region, "eu-west");
        assert!(b.project_get("us").await.unwrap().is_none());
        assert_eq!(
            b.region_get("eu-west").await.unwrap().unwrap().description,
            "Europe West"
        );
        assert!(b.compute_class_list().await.unwrap()[0].default);
        assert_eq!(b.volume_class_get("ssd").await.unwrap().unwrap().name, "ssd");
        assert_eq!(b.volume_class_list().await.unwrap().len(), 1);
    }
}

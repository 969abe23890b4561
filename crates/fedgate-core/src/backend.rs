//! Backend trait - one isolated scope reachable through the gateway

use std::collections::BTreeMap;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{BackendError, BackendResult};
use crate::models::{
    App, AppRunOptions, AppUpdateOptions, ContainerReplica, ContainerReplicaListOptions,
    ComputeClass, Credential, Event, EventList, EventStreamOptions, Image, ImageDeleteOptions, Info,
    LogMessage, LogOptions, Project, Region, Secret, Volume, VolumeClass,
};

/// Live event subscription for one backend
pub type EventFeed = BoxStream<'static, BackendResult<Event>>;

/// Live application log output
pub type LogFeed = BoxStream<'static, LogMessage>;

/// A live, authorized connection to one scope (tenant, region, cluster).
///
/// All names passed in are backend-local; the gateway strips scope
/// prefixes before calling and adds them back to results. Backends leave
/// default implementations for operations they don't support.
#[async_trait]
pub trait Backend: Send + Sync {
    // =========================================================================
    // Identity
    // =========================================================================

    /// Scope identifier (e.g. `"acme/us-east"`)
    fn scope_id(&self) -> &str;

    /// Namespace used for routing within the scope
    fn namespace(&self) -> &str;

    // =========================================================================
    // Apps
    // =========================================================================

    async fn app_list(&self) -> BackendResult<Vec<App>>;

    /// Get an app; `None` when it does not exist
    async fn app_get(&self, name: &str) -> BackendResult<Option<App>> {
        let _ = name;
        Err(BackendError::NotSupported("app_get".to_string()))
    }

    /// Delete an app; returns the deleted app, `None` when it did not exist
    async fn app_delete(&self, name: &str) -> BackendResult<Option<App>> {
        let _ = name;
        Err(BackendError::NotSupported("app_delete".to_string()))
    }

    async fn app_run(&self, image: &str, opts: &AppRunOptions) -> BackendResult<App> {
        let _ = (image, opts);
        Err(BackendError::NotSupported("app_run".to_string()))
    }

    async fn app_update(&self, name: &str, opts: &AppUpdateOptions) -> BackendResult<App> {
        let _ = (name, opts);
        Err(BackendError::NotSupported("app_update".to_string()))
    }

    async fn app_start(&self, name: &str) -> BackendResult<()> {
        let _ = name;
        Err(BackendError::NotSupported("app_start".to_string()))
    }

    async fn app_stop(&self, name: &str) -> BackendResult<()> {
        let _ = name;
        Err(BackendError::NotSupported("app_stop".to_string()))
    }

    async fn app_confirm_upgrade(&self, name: &str) -> BackendResult<()> {
        let _ = name;
        Err(BackendError::NotSupported("app_confirm_upgrade".to_string()))
    }

    async fn app_pull_image(&self, name: &str) -> BackendResult<()> {
        let _ = name;
        Err(BackendError::NotSupported("app_pull_image".to_string()))
    }

    /// Remove an app stuck in deletion without waiting for its cleanup
    async fn app_ignore_delete_cleanup(&self, name: &str) -> BackendResult<()> {
        let _ = name;
        Err(BackendError::NotSupported(
            "app_ignore_delete_cleanup".to_string(),
        ))
    }

    /// Stream log lines of an app
    async fn app_logs(&self, name: &str, opts: &LogOptions) -> BackendResult<LogFeed> {
        let _ = (name, opts);
        Err(BackendError::NotSupported("app_logs".to_string()))
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
        let _ = (name, secret_type, data);
        Err(BackendError::NotSupported("secret_create".to_string()))
    }

    async fn secret_list(&self) -> BackendResult<Vec<Secret>> {
        Err(BackendError::NotSupported("secret_list".to_string()))
    }

    /// Get a secret with its values withheld
    async fn secret_get(&self, name: &str) -> BackendResult<Option<Secret>> {
        let _ = name;
        Err(BackendError::NotSupported("secret_get".to_string()))
    }

    /// Get a secret including its values
    async fn secret_reveal(&self, name: &str) -> BackendResult<Option<Secret>> {
        let _ = name;
        Err(BackendError::NotSupported("secret_reveal".to_string()))
    }

    async fn secret_update(
        &self,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> BackendResult<Secret> {
        let _ = (name, data);
        Err(BackendError::NotSupported("secret_update".to_string()))
    }

    async fn secret_delete(&self, name: &str) -> BackendResult<Option<Secret>> {
        let _ = name;
        Err(BackendError::NotSupported("secret_delete".to_string()))
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
        let _ = (server_address, username, password);
        Err(BackendError::NotSupported("credential_create".to_string()))
    }

    async fn credential_list(&self) -> BackendResult<Vec<Credential>> {
        Err(BackendError::NotSupported("credential_list".to_string()))
    }

    async fn credential_get(&self, server_address: &str) -> BackendResult<Option<Credential>> {
        let _ = server_address;
        Err(BackendError::NotSupported("credential_get".to_string()))
    }

    async fn credential_update(
        &self,
        server_address: &str,
        username: &str,
        password: &str,
    ) -> BackendResult<Credential> {
        let _ = (server_address, username, password);
        Err(BackendError::NotSupported("credential_update".to_string()))
    }

    async fn credential_delete(&self, server_address: &str) -> BackendResult<Option<Credential>> {
        let _ = server_address;
        Err(BackendError::NotSupported("credential_delete".to_string()))
    }

    // =========================================================================
    // Volumes and container replicas
    // =========================================================================

    async fn volume_list(&self) -> BackendResult<Vec<Volume>> {
        Err(BackendError::NotSupported("volume_list".to_string()))
    }

    async fn volume_get(&self, name: &str) -> BackendResult<Option<Volume>> {
        let _ = name;
        Err(BackendError::NotSupported("volume_get".to_string()))
    }

    async fn volume_delete(&self, name: &str) -> BackendResult<Option<Volume>> {
        let _ = name;
        Err(BackendError::NotSupported("volume_delete".to_string()))
    }

    async fn container_replica_list(
        &self,
        opts: &ContainerReplicaListOptions,
    ) -> BackendResult<Vec<ContainerReplica>> {
        let _ = opts;
        Err(BackendError::NotSupported(
            "container_replica_list".to_string(),
        ))
    }

    async fn container_replica_get(&self, name: &str) -> BackendResult<Option<ContainerReplica>> {
        let _ = name;
        Err(BackendError::NotSupported(
            "container_replica_get".to_string(),
        ))
    }

    async fn container_replica_delete(
        &self,
        name: &str,
    ) -> BackendResult<Option<ContainerReplica>> {
        let _ = name;
        Err(BackendError::NotSupported(
            "container_replica_delete".to_string(),
        ))
    }

    // =========================================================================
    // Images (unscoped; only ever served by the default backend)
    // =========================================================================

    async fn image_list(&self) -> BackendResult<Vec<Image>> {
        Err(BackendError::NotSupported("image_list".to_string()))
    }

    async fn image_get(&self, name: &str) -> BackendResult<Option<Image>> {
        let _ = name;
        Err(BackendError::NotSupported("image_get".to_string()))
    }

    async fn image_delete(
        &self,
        name: &str,
        opts: &ImageDeleteOptions,
    ) -> BackendResult<Option<Image>> {
        let _ = (name, opts);
        Err(BackendError::NotSupported("image_delete".to_string()))
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Projects visible from this scope. Names are local to the scope's
    /// parent (the account that owns sibling projects).
    async fn project_list(&self) -> BackendResult<Vec<Project>> {
        Err(BackendError::NotSupported("project_list".to_string()))
    }

    async fn project_get(&self, name: &str) -> BackendResult<Option<Project>> {
        let _ = name;
        Err(BackendError::NotSupported("project_get".to_string()))
    }

    // =========================================================================
    // Regions and classes
    // =========================================================================

    async fn region_list(&self) -> BackendResult<Vec<Region>> {
        Err(BackendError::NotSupported("region_list".to_string()))
    }

    async fn region_get(&self, name: &str) -> BackendResult<Option<Region>> {
        let _ = name;
        Err(BackendError::NotSupported("region_get".to_string()))
    }

    async fn compute_class_list(&self) -> BackendResult<Vec<ComputeClass>> {
        Err(BackendError::NotSupported("compute_class_list".to_string()))
    }

    async fn compute_class_get(&self, name: &str) -> BackendResult<Option<ComputeClass>> {
        let _ = name;
        Err(BackendError::NotSupported("compute_class_get".to_string()))
    }

    async fn volume_class_list(&self) -> BackendResult<Vec<VolumeClass>> {
        Err(BackendError::NotSupported("volume_class_list".to_string()))
    }

    async fn volume_class_get(&self, name: &str) -> BackendResult<Option<VolumeClass>> {
        let _ = name;
        Err(BackendError::NotSupported("volume_class_get".to_string()))
    }

    // =========================================================================
    // Info
    // =========================================================================

    async fn info(&self) -> BackendResult<Vec<Info>> {
        Ok(vec![Info::default()])
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Historical events matching `opts`, plus the cursor to watch from
    async fn list_events(&self, opts: &EventStreamOptions) -> BackendResult<EventList>;

    /// Live events newer than `opts.resource_version`
    async fn watch_events(&self, opts: &EventStreamOptions) -> BackendResult<EventFeed> {
        let _ = opts;
        Err(BackendError::NotSupported("watch_events".to_string()))
    }
}

//! Typed per-resource surface of the gateway.
//!
//! Every call here is a thin binding of one backend operation to one of
//! the generic primitives in `gateway.rs`.

use std::collections::BTreeMap;

use fedgate_core::routing::parent_scope;
use fedgate_core::{
    App, AppRunOptions, AppUpdateOptions, ComputeClass, ContainerReplica,
    ContainerReplicaListOptions, Credential, Image, ImageDeleteOptions, Info, LogFeed, LogOptions,
    Project, Region, Scoped, Secret, Volume, VolumeClass,
};

use crate::error::GatewayResult;
use crate::gateway::FederatedGateway;

impl FederatedGateway {
    // =========================================================================
    // Apps
    // =========================================================================

    pub async fn app_list(&self) -> GatewayResult<Vec<App>> {
        self.aggregate(|b| async move { b.app_list().await }).await
    }

    pub async fn app_get(&self, name: &str) -> GatewayResult<Option<App>> {
        self.dispatch(name, |name, b| async move { b.app_get(&name).await })
            .await
    }

    pub async fn app_delete(&self, name: &str) -> GatewayResult<Option<App>> {
        self.dispatch(name, |name, b| async move { b.app_delete(&name).await })
            .await
    }

    /// Run `image` as a new app. `opts.name` may carry a scope prefix
    /// selecting the backend; the backend sees only the local name.
    pub async fn app_run(&self, image: &str, opts: &AppRunOptions) -> GatewayResult<App> {
        self.dispatch(&opts.name, |name, b| async move {
            let local = AppRunOptions {
                name,
                ..opts.clone()
            };
            b.app_run(image, &local).await
        })
        .await
    }

    pub async fn app_update(&self, name: &str, opts: &AppUpdateOptions) -> GatewayResult<App> {
        self.dispatch(name, |name, b| async move { b.app_update(&name, opts).await })
            .await
    }

    pub async fn app_start(&self, name: &str) -> GatewayResult<()> {
        self.dispatch(name, |name, b| async move { b.app_start(&name).await })
            .await
    }

    pub async fn app_stop(&self, name: &str) -> GatewayResult<()> {
        self.dispatch(name, |name, b| async move { b.app_stop(&name).await })
            .await
    }

    pub async fn app_confirm_upgrade(&self, name: &str) -> GatewayResult<()> {
        self.dispatch(name, |name, b| async move {
            b.app_confirm_upgrade(&name).await
        })
        .await
    }

    pub async fn app_pull_image(&self, name: &str) -> GatewayResult<()> {
        self.dispatch(name, |name, b| async move { b.app_pull_image(&name).await })
            .await
    }

    pub async fn app_ignore_delete_cleanup(&self, name: &str) -> GatewayResult<()> {
        self.dispatch(name, |name, b| async move {
            b.app_ignore_delete_cleanup(&name).await
        })
        .await
    }

    /// Log lines of one app; `app_name` on each line is scope-prefixed
    /// for non-default backends.
    pub async fn app_logs(&self, name: &str, opts: &LogOptions) -> GatewayResult<LogFeed> {
        self.dispatch(name, |name, b| async move { b.app_logs(&name, opts).await })
            .await
    }

    // =========================================================================
    // Secrets
    // =========================================================================

    pub async fn secret_create(
        &self,
        name: &str,
        secret_type: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> GatewayResult<Secret> {
        self.dispatch(name, |name, b| async move {
            b.secret_create(&name, secret_type, data).await
        })
        .await
    }

    pub async fn secret_list(&self) -> GatewayResult<Vec<Secret>> {
        self.aggregate(|b| async move { b.secret_list().await }).await
    }

    pub async fn secret_get(&self, name: &str) -> GatewayResult<Option<Secret>> {
        self.dispatch(name, |name, b| async move { b.secret_get(&name).await })
            .await
    }

    pub async fn secret_reveal(&self, name: &str) -> GatewayResult<Option<Secret>> {
        self.dispatch(name, |name, b| async move { b.secret_reveal(&name).await })
            .await
    }

    pub async fn secret_update(
        &self,
        name: &str,
        data: BTreeMap<String, Vec<u8>>,
    ) -> GatewayResult<Secret> {
        self.dispatch(name, |name, b| async move {
            b.secret_update(&name, data).await
        })
        .await
    }

    pub async fn secret_delete(&self, name: &str) -> GatewayResult<Option<Secret>> {
        self.dispatch(name, |name, b| async move { b.secret_delete(&name).await })
            .await
    }

    // =========================================================================
    // Registry credentials (keyed by server address)
    // =========================================================================

    pub async fn credential_create(
        &self,
        server_address: &str,
        username: &str,
        password: &str,
    ) -> GatewayResult<Credential> {
        self.dispatch(server_address, |server, b| async move {
            b.credential_create(&server, username, password).await
        })
        .await
    }

    pub async fn credential_list(&self) -> GatewayResult<Vec<Credential>> {
        self.aggregate(|b| async move { b.credential_list().await })
            .await
    }

    pub async fn credential_get(&self, server_address: &str) -> GatewayResult<Option<Credential>> {
        self.dispatch(server_address, |server, b| async move {
            b.credential_get(&server).await
        })
        .await
    }

    pub async fn credential_update(
        &self,
        server_address: &str,
        username: &str,
        password: &str,
    ) -> GatewayResult<Credential> {
        self.dispatch(server_address, |server, b| async move {
            b.credential_update(&server, username, password).await
        })
        .await
    }

    pub async fn credential_delete(
        &self,
        server_address: &str,
    ) -> GatewayResult<Option<Credential>> {
        self.dispatch(server_address, |server, b| async move {
            b.credential_delete(&server).await
        })
        .await
    }

    // =========================================================================
    // Volumes
    // =========================================================================

    pub async fn volume_list(&self) -> GatewayResult<Vec<Volume>> {
        self.aggregate(|b| async move { b.volume_list().await }).await
    }

    pub async fn volume_get(&self, name: &str) -> GatewayResult<Option<Volume>> {
        self.dispatch(name, |name, b| async move { b.volume_get(&name).await })
            .await
    }

    pub async fn volume_delete(&self, name: &str) -> GatewayResult<Option<Volume>> {
        self.dispatch(name, |name, b| async move { b.volume_delete(&name).await })
            .await
    }

    // =========================================================================
    // Container replicas
    // =========================================================================

    /// All replicas, or only those of `opts.app`. Filtering by app routes
    /// to the app's backend alone and scope-prefixes every replica.
    pub async fn container_replica_list(
        &self,
        opts: &ContainerReplicaListOptions,
    ) -> GatewayResult<Vec<ContainerReplica>> {
        match &opts.app {
            Some(app) => {
                self.dispatch(app, |app, b| async move {
                    let local = ContainerReplicaListOptions { app: Some(app) };
                    b.container_replica_list(&local).await
                })
                .await
            }
            None => {
                self.aggregate(|b| async move { b.container_replica_list(opts).await })
                    .await
            }
        }
    }

    pub async fn container_replica_get(
        &self,
        name: &str,
    ) -> GatewayResult<Option<ContainerReplica>> {
        self.dispatch(name, |name, b| async move {
            b.container_replica_get(&name).await
        })
        .await
    }

    pub async fn container_replica_delete(
        &self,
        name: &str,
    ) -> GatewayResult<Option<ContainerReplica>> {
        self.dispatch(name, |name, b| async move {
            b.container_replica_delete(&name).await
        })
        .await
    }

    // =========================================================================
    // Images (default backend only)
    // =========================================================================

    pub async fn image_list(&self) -> GatewayResult<Vec<Image>> {
        self.on_default(|b| async move { b.image_list().await })
            .await
    }

    pub async fn image_get(&self, name: &str) -> GatewayResult<Option<Image>> {
        self.on_default(|b| async move { b.image_get(name).await })
            .await
    }

    pub async fn image_delete(
        &self,
        name: &str,
        opts: &ImageDeleteOptions,
    ) -> GatewayResult<Option<Image>> {
        self.on_default(|b| async move { b.image_delete(name, opts).await })
            .await
    }

    // =========================================================================
    // Projects
    // =========================================================================

    /// Projects seen from every backend. A backend lists projects relative
    /// to its parent scope, so names get that parent as prefix (not the
    /// backend's own scope), yielding names that address the project's
    /// own scope. Applies to the default backend too.
    pub async fn project_list(&self) -> GatewayResult<Vec<Project>> {
        self.aggregate_unnamed(|b| async move {
            let mut projects = b.project_list().await?;
            if let Some(parent) = parent_scope(b.scope_id()) {
                projects.apply_scope(parent);
            }
            Ok(projects)
        })
        .await
    }

    pub async fn project_get(&self, name: &str) -> GatewayResult<Option<Project>> {
        self.dispatch(name, |name, b| async move { b.project_get(&name).await })
            .await
    }

    // =========================================================================
    // Regions and classes
    // =========================================================================

    pub async fn region_list(&self) -> GatewayResult<Vec<Region>> {
        self.aggregate(|b| async move { b.region_list().await }).await
    }

    pub async fn region_get(&self, name: &str) -> GatewayResult<Option<Region>> {
        self.dispatch(name, |name, b| async move { b.region_get(&name).await })
            .await
    }

    pub async fn compute_class_list(&self) -> GatewayResult<Vec<ComputeClass>> {
        self.aggregate(|b| async move { b.compute_class_list().await })
            .await
    }

    pub async fn compute_class_get(&self, name: &str) -> GatewayResult<Option<ComputeClass>> {
        self.dispatch(name, |name, b| async move {
            b.compute_class_get(&name).await
        })
        .await
    }

    pub async fn volume_class_list(&self) -> GatewayResult<Vec<VolumeClass>> {
        self.aggregate(|b| async move { b.volume_class_list().await })
            .await
    }

    pub async fn volume_class_get(&self, name: &str) -> GatewayResult<Option<VolumeClass>> {
        self.dispatch(name, |name, b| async move {
            b.volume_class_get(&name).await
        })
        .await
    }

    // =========================================================================
    // Info
    // =========================================================================

    /// One summary per backend, stamped with its scope and namespace
    pub async fn info(&self) -> GatewayResult<Vec<Info>> {
        self.aggregate_unnamed(|b| async move {
            let mut infos = b.info().await?;
            for info in &mut infos {
                info.name = b.scope_id().to_string();
                info.namespace = b.namespace().to_string();
            }
            Ok(infos)
        })
        .await
    }
}

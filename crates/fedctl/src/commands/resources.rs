//! Listing and lookup commands

use anyhow::Result;
use fedgate::{ContainerReplicaListOptions, FederatedGateway};

use crate::output::{
    AppRow, ComputeClassRow, CredentialRow, ImageRow, InfoRow, OutputContext, ProjectRow,
    RegionRow, ReplicaRow, SecretRow, VolumeClassRow, VolumeRow,
};

/// List apps across every backend
pub async fn apps(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let apps = gateway.app_list().await?;
    ctx.print::<_, AppRow>(&apps);
    Ok(())
}

/// Show one app by composite name
pub async fn app(gateway: &FederatedGateway, name: &str, ctx: &OutputContext) -> Result<()> {
    let app = gateway.app_get(name).await?;
    ctx.print_one::<_, AppRow>(name, app.as_ref());
    Ok(())
}

pub async fn secrets(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let secrets = gateway.secret_list().await?;
    ctx.print::<_, SecretRow>(&secrets);
    Ok(())
}

pub async fn volumes(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let volumes = gateway.volume_list().await?;
    ctx.print::<_, VolumeRow>(&volumes);
    Ok(())
}

/// List container replicas, optionally only those of one app
pub async fn replicas(
    gateway: &FederatedGateway,
    app: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let opts = ContainerReplicaListOptions {
        app: app.map(String::from),
    };
    let replicas = gateway.container_replica_list(&opts).await?;
    ctx.print::<_, ReplicaRow>(&replicas);
    Ok(())
}

pub async fn credentials(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let credentials = gateway.credential_list().await?;
    ctx.print::<_, CredentialRow>(&credentials);
    Ok(())
}

/// List images of the default backend
pub async fn images(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let images = gateway.image_list().await?;
    ctx.print::<_, ImageRow>(&images);
    Ok(())
}

/// List projects reachable through every backend
pub async fn projects(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let projects = gateway.project_list().await?;
    ctx.print::<_, ProjectRow>(&projects);
    Ok(())
}

pub async fn regions(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let regions = gateway.region_list().await?;
    ctx.print::<_, RegionRow>(&regions);
    Ok(())
}

pub async fn compute_classes(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let classes = gateway.compute_class_list().await?;
    ctx.print::<_, ComputeClassRow>(&classes);
    Ok(())
}

pub async fn volume_classes(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let classes = gateway.volume_class_list().await?;
    ctx.print::<_, VolumeClassRow>(&classes);
    Ok(())
}

/// Show a summary of every backend
pub async fn info(gateway: &FederatedGateway, ctx: &OutputContext) -> Result<()> {
    let info = gateway.info().await?;
    ctx.print::<_, InfoRow>(&info);
    Ok(())
}

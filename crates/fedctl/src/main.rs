//! fedctl - Command-line front end for the federated gateway
//!
//! Loads an ordered set of backends from a TOML file and issues gateway
//! calls against them. Names of resources in non-default backends are
//! printed as `<scope>/<name>` and accepted in the same form.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fedgate::{CancellationToken, FederatedGateway};
use fedgate_memory::{MemoryBackend, StaticRegistry};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

/// Scope of the single backend used when no config file is given
const LOCAL_SCOPE: &str = "local";

#[derive(Parser)]
#[command(name = "fedctl")]
#[command(author, version, about = "Federated gateway CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "FEDCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List apps in every backend
    Apps,

    /// Show one app
    App {
        /// App name, `<scope>/<name>` for non-default backends
        name: String,
    },

    /// Print an app's log lines
    Logs {
        /// App name, `<scope>/<name>` for non-default backends
        app: String,

        /// Keep streaming new lines
        #[arg(short, long)]
        follow: bool,

        /// Only the last N lines
        #[arg(long)]
        tail: Option<usize>,
    },

    /// List secrets in every backend (values withheld)
    Secrets,

    /// List volumes in every backend
    Volumes,

    /// List container replicas
    Replicas {
        /// Only replicas of this app
        #[arg(long)]
        app: Option<String>,
    },

    /// List registry credentials in every backend
    Credentials,

    /// List images of the default backend
    Images,

    /// List projects reachable through every backend
    Projects,

    /// List regions of every backend
    Regions,

    /// List compute classes of every backend
    ComputeClasses,

    /// List volume classes of every backend
    VolumeClasses,

    /// Show a summary of every backend
    Info,

    /// Print events from every backend, oldest first
    Events {
        /// Keep streaming live events after the history
        #[arg(short, long)]
        follow: bool,

        /// Only the last N historical events per backend
        #[arg(long)]
        tail: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("fedctl=debug,fedgate=debug,fedgate_memory=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("fedctl=info,fedgate=info,fedgate_memory=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let gateway = create_gateway(cli.config.as_ref())?;
    let ctx = OutputContext::new(cli.output, cli.no_color, cli.quiet);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("Received Ctrl+C");
            on_signal.cancel();
        }
    });

    let result = match &cli.command {
        Commands::Apps => commands::apps(&gateway, &ctx).await,
        Commands::App { name } => commands::app(&gateway, name, &ctx).await,
        Commands::Logs { app, follow, tail } => {
            commands::logs(&gateway, app, *follow, *tail, &cancel, &ctx).await
        }
        Commands::Secrets => commands::secrets(&gateway, &ctx).await,
        Commands::Volumes => commands::volumes(&gateway, &ctx).await,
        Commands::Replicas { app } => commands::replicas(&gateway, app.as_deref(), &ctx).await,
        Commands::Credentials => commands::credentials(&gateway, &ctx).await,
        Commands::Images => commands::images(&gateway, &ctx).await,
        Commands::Projects => commands::projects(&gateway, &ctx).await,
        Commands::Regions => commands::regions(&gateway, &ctx).await,
        Commands::ComputeClasses => commands::compute_classes(&gateway, &ctx).await,
        Commands::VolumeClasses => commands::volume_classes(&gateway, &ctx).await,
        Commands::Info => commands::info(&gateway, &ctx).await,
        Commands::Events { follow, tail } => {
            commands::events(&gateway, *follow, *tail, &cancel, &ctx).await
        }
    };

    cancel.cancel();
    result
}

/// Build the gateway from the config file, or a single empty local
/// backend when none is given
fn create_gateway(path: Option<&PathBuf>) -> Result<FederatedGateway> {
    let Some(path) = path else {
        info!(scope = LOCAL_SCOPE, "No config file given, using an empty local backend");
        let registry = StaticRegistry::new(LOCAL_SCOPE)
            .with_backend(Arc::new(MemoryBackend::new(LOCAL_SCOPE, "default")));
        return Ok(FederatedGateway::new(Arc::new(registry)));
    };

    let config = Config::load_from(path)?;
    let registry =
        StaticRegistry::from_config(&config.registry).context("Invalid registry config")?;
    info!(
        config = %path.display(),
        scopes = ?registry.scope_ids(),
        "Loaded registry"
    );
    FederatedGateway::with_config(Arc::new(registry), config.gateway)
        .context("Invalid gateway config")
}

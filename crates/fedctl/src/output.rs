//! Output formatting for fedctl (json, table)

use clap::ValueEnum;
use colored::Colorize;
use fedgate::{
    App, ComputeClass, ContainerReplica, Credential, Event, Image, Info, LogMessage, Project,
    Region, Secret, Volume, VolumeClass,
};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    /// ASCII table
    Table,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print an info message to stderr (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.green());
        }
    }

    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print a list in the configured format
    pub fn print<T, R>(&self, items: &[T])
    where
        T: Serialize,
        R: Tabled + for<'a> From<&'a T>,
    {
        match self.format {
            OutputFormat::Json => print_json(items),
            OutputFormat::Table => {
                if items.is_empty() {
                    self.info("No resources found");
                } else {
                    let rows: Vec<R> = items.iter().map(R::from).collect();
                    println!("{}", Table::new(rows));
                }
            }
        }
    }

    /// Print one item, or a not-found message
    pub fn print_one<T, R>(&self, name: &str, item: Option<&T>)
    where
        T: Serialize,
        R: Tabled + for<'a> From<&'a T>,
    {
        match item {
            Some(item) => self.print::<T, R>(std::slice::from_ref(item)),
            None => self.error(&format!("{} not found", name)),
        }
    }

    /// Print a single streamed item (event or log line) as one line
    pub fn print_line<T: Serialize + std::fmt::Display>(&self, item: &T) {
        match self.format {
            OutputFormat::Json => match serde_json::to_string(item) {
                Ok(line) => println!("{}", line),
                Err(e) => self.error(&format!("Failed to encode output: {}", e)),
            },
            OutputFormat::Table => println!("{}", item),
        }
    }
}

fn print_json<T: Serialize>(items: &[T]) {
    println!(
        "{}",
        serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string())
    );
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

// =============================================================================
// Display types for each resource
// =============================================================================

#[derive(Debug, Tabled)]
pub struct AppRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Image")]
    pub image: String,
    #[tabled(rename = "State")]
    pub state: String,
}

impl From<&App> for AppRow {
    fn from(app: &App) -> Self {
        let state = match (app.stopped, app.upgrade_pending) {
            (true, _) => "stopped",
            (false, true) => "upgrade pending",
            (false, false) => "running",
        };
        Self {
            name: app.name.clone(),
            image: app.image.clone(),
            state: state.to_string(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct SecretRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub secret_type: String,
    #[tabled(rename = "Keys")]
    pub keys: String,
}

impl From<&Secret> for SecretRow {
    fn from(secret: &Secret) -> Self {
        Self {
            name: secret.name.clone(),
            secret_type: secret.secret_type.clone(),
            keys: secret.keys.join(", "),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct CredentialRow {
    #[tabled(rename = "Server")]
    pub server_address: String,
    #[tabled(rename = "Username")]
    pub username: String,
}

impl From<&Credential> for CredentialRow {
    fn from(credential: &Credential) -> Self {
        Self {
            server_address: credential.server_address.clone(),
            username: credential.username.clone(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct VolumeRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Capacity")]
    pub capacity: String,
    #[tabled(rename = "App")]
    pub app_name: String,
    #[tabled(rename = "Status")]
    pub status: String,
}

impl From<&Volume> for VolumeRow {
    fn from(volume: &Volume) -> Self {
        Self {
            name: volume.name.clone(),
            capacity: or_dash(volume.capacity.as_deref()),
            app_name: or_dash(volume.app_name.as_deref()),
            status: volume.status.clone(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct ReplicaRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "App")]
    pub app_name: String,
    #[tabled(rename = "Container")]
    pub container_name: String,
    #[tabled(rename = "State")]
    pub state: String,
}

impl From<&ContainerReplica> for ReplicaRow {
    fn from(replica: &ContainerReplica) -> Self {
        Self {
            name: replica.name.clone(),
            app_name: replica.app_name.clone(),
            container_name: replica.container_name.clone(),
            state: replica.state.clone(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct ImageRow {
    #[tabled(rename = "ID")]
    pub name: String,
    #[tabled(rename = "Tags")]
    pub tags: String,
}

impl From<&Image> for ImageRow {
    fn from(image: &Image) -> Self {
        Self {
            name: image.name.clone(),
            tags: image.tags.join(", "),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct ProjectRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Default Region")]
    pub default_region: String,
    #[tabled(rename = "Regions")]
    pub regions: String,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            name: project.name.clone(),
            default_region: or_dash(
                Some(project.default_region.as_str()).filter(|r| !r.is_empty()),
            ),
            regions: project.supported_regions.join(", "),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct RegionRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Region> for RegionRow {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            description: region.description.clone(),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct ComputeClassRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Default")]
    pub default: bool,
    #[tabled(rename = "CPU")]
    pub cpu: String,
    #[tabled(rename = "Memory")]
    pub memory: String,
}

impl From<&ComputeClass> for ComputeClassRow {
    fn from(class: &ComputeClass) -> Self {
        Self {
            name: class.name.clone(),
            default: class.default,
            cpu: or_dash(class.cpu.as_deref()),
            memory: or_dash(class.memory.as_deref()),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct VolumeClassRow {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Default")]
    pub default: bool,
    #[tabled(rename = "Storage Class")]
    pub storage_class: String,
    #[tabled(rename = "Size")]
    pub size: String,
}

impl From<&VolumeClass> for VolumeClassRow {
    fn from(class: &VolumeClass) -> Self {
        Self {
            name: class.name.clone(),
            default: class.default,
            storage_class: or_dash(class.storage_class.as_deref()),
            size: format!(
                "{}..{}",
                class.min_size.as_deref().unwrap_or(""),
                class.max_size.as_deref().unwrap_or("")
            ),
        }
    }
}

#[derive(Debug, Tabled)]
pub struct InfoRow {
    #[tabled(rename = "Scope")]
    pub name: String,
    #[tabled(rename = "Namespace")]
    pub namespace: String,
    #[tabled(rename = "Region")]
    pub region: String,
    #[tabled(rename = "Version")]
    pub version: String,
}

impl From<&Info> for InfoRow {
    fn from(info: &Info) -> Self {
        Self {
            name: info.name.clone(),
            namespace: info.namespace.clone(),
            region: or_dash(info.region.as_deref()),
            version: or_dash(info.version.as_deref()),
        }
    }
}

/// One event per line in table mode
pub struct EventLine<'a>(pub &'a Event);

impl Serialize for EventLine<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl std::fmt::Display for EventLine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let event = self.0;
        write!(
            f,
            "{}  {:<14} {:<30} {}",
            event.observed.format("%Y-%m-%d %H:%M:%S"),
            event.event_type.bold(),
            event.name,
            event.description
        )
    }
}

/// One log line per line in table mode
pub struct LogLine<'a>(pub &'a LogMessage);

impl Serialize for LogLine<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl std::fmt::Display for LogLine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} | {}", self.0.app_name.cyan(), self.0.line)
    }
}

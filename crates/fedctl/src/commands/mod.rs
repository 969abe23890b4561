//! Command implementations for fedctl

pub mod events;
pub mod logs;
pub mod resources;

pub use events::events;
pub use logs::logs;
pub use resources::{
    app, apps, compute_classes, credentials, images, info, projects, regions, replicas, secrets,
    volume_classes, volumes,
};

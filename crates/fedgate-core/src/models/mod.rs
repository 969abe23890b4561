//! Shared resource models served through the gateway

mod app;
mod event;
mod image;
mod info;
mod project;
mod secret;
mod volume;

pub use app::*;
pub use event::*;
pub use image::*;
pub use info::*;
pub use project::*;
pub use secret::*;
pub use volume::*;

crate::identified! {
    App => name,
    Secret => name,
    Credential => server_address,
    Volume => name,
    ContainerReplica => name,
    Image => name,
    Event => name,
    Project => name,
    Region => name,
    ComputeClass => name,
    VolumeClass => name,
}

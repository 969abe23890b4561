//! fedgate-core - Core traits and types for the federated resource gateway
//!
//! This crate provides the abstractions shared by every layer of the
//! gateway: the [`Backend`] handle for one isolated scope, the
//! [`BackendRegistry`] that owns those handles, composite-name routing,
//! and the resource models that flow through the gateway.

pub mod backend;
pub mod error;
pub mod models;
pub mod registry;
pub mod routing;
pub mod scoped;

pub use backend::{Backend, EventFeed, LogFeed};
pub use error::{BackendError, BackendResult};
pub use models::*;
pub use registry::BackendRegistry;
pub use routing::CompositeName;
pub use scoped::{Identified, Scoped};

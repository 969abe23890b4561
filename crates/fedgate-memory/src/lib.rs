//! fedgate-memory - In-process backends for the federated gateway
//!
//! Provides [`MemoryBackend`], a complete [`fedgate_core::Backend`] kept
//! entirely in memory, and [`StaticRegistry`], an ordered registry of
//! backends. Both can be built from a TOML [`RegistryConfig`].

pub mod backend;
pub mod config;
pub mod registry;

pub use backend::MemoryBackend;
pub use config::{ConfigError, RegistryConfig, ScopeConfig};
pub use registry::StaticRegistry;

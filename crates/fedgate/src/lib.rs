//! fedgate - Federated multi-backend resource gateway
//!
//! This crate provides the [`FederatedGateway`] that presents many
//! independent backends (one per tenant, region or cluster scope) as a
//! single API.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        FederatedGateway                          │
//! │                                                                  │
//! │   "acme/eu/web" ──► resolve ──► dispatch ──► rewrite to scope    │
//! │   list          ──► aggregate (fan-out, fail fast, in order)     │
//! │   events        ──► snapshot (sorted) ──► live fan-in            │
//! │                              │                                   │
//! │              ┌───────────────┼───────────────┐                   │
//! │              ▼               ▼               ▼                   │
//! │      ┌──────────────┐ ┌──────────────┐ ┌──────────────┐          │
//! │      │   Backend    │ │   Backend    │ │   Backend    │          │
//! │      │  (default)   │ │  (acme/eu)   │ │  (acme/us)   │          │
//! │      └──────────────┘ └──────────────┘ └──────────────┘          │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use fedgate::FederatedGateway;
//!
//! let gateway = FederatedGateway::new(registry);
//!
//! let apps = gateway.app_list().await?;
//! // Returns: ["web", "acme/eu/db", ...]
//!
//! let app = gateway.app_get("acme/eu/db").await?;
//! ```

mod config;
mod diagnostics;
mod error;
mod events;
mod gateway;
mod resources;

pub use config::GatewayConfig;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::{GatewayError, GatewayResult};
pub use events::EventStream;
pub use gateway::FederatedGateway;

// Re-export core types for convenience
pub use fedgate_core::{
    models::*, Backend, BackendError, BackendRegistry, BackendResult, CompositeName, EventFeed,
    Identified, LogFeed, Scoped,
};
pub use tokio_util::sync::CancellationToken;

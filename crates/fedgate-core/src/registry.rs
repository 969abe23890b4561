//! Backend registry - owns backend lifecycles, hands out borrowed handles

use std::sync::Arc;

use async_trait::async_trait;

use crate::backend::Backend;
use crate::error::BackendResult;

/// Source of backends for the gateway.
///
/// Implementations must be safe for concurrent reads: many gateway calls
/// resolve and list backends at the same time.
#[async_trait]
pub trait BackendRegistry: Send + Sync {
    /// Backend for `scope`; an empty scope means [`Self::default_scope`].
    ///
    /// May block while a connection is established.
    async fn for_scope(&self, scope: &str) -> BackendResult<Arc<dyn Backend>>;

    /// Every registered backend, in registry order
    async fn list(&self) -> BackendResult<Vec<Arc<dyn Backend>>>;

    /// Scope of the default backend; results from it are never prefixed
    fn default_scope(&self) -> &str;
}

//! Federated gateway - routes calls to scoped backends and merges results
//!
//! Three fan-out primitives carry every gateway call:
//! - [`FederatedGateway::dispatch`] resolves one backend from a composite
//!   name and runs a caller-supplied operation against it
//! - [`FederatedGateway::aggregate`] runs a list operation against every
//!   backend and concatenates the results in registry order
//! - [`FederatedGateway::event_stream`] (see `events.rs`) merges historical
//!   and live events from every backend
//!
//! Results from any backend other than the registry default get their
//! identifiers rewritten to `"<scope>/<local>"` exactly once, after the
//! backend call has succeeded.

use std::future::Future;
use std::sync::Arc;

use fedgate_core::{Backend, BackendRegistry, BackendResult, CompositeName, Identified, Scoped};
use futures::future::try_join_all;
use tracing::{debug, info};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult};

/// A single logical API over many independent backends
pub struct FederatedGateway {
    registry: Arc<dyn BackendRegistry>,
    config: GatewayConfig,
}

impl FederatedGateway {
    /// Create a gateway with default configuration
    pub fn new(registry: Arc<dyn BackendRegistry>) -> Self {
        Self {
            registry,
            config: GatewayConfig::default(),
        }
    }

    /// Create a gateway with explicit configuration
    pub fn with_config(
        registry: Arc<dyn BackendRegistry>,
        config: GatewayConfig,
    ) -> GatewayResult<Self> {
        config.validate()?;
        info!(
            default_scope = %registry.default_scope(),
            event_buffer = config.event_buffer,
            "Creating federated gateway"
        );
        Ok(Self { registry, config })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn BackendRegistry> {
        &self.registry
    }

    /// Split a composite name into scope and local name
    pub fn resolve<'a>(&self, name: &'a str) -> CompositeName<'a> {
        CompositeName::parse(name)
    }

    /// Run `op` against the backend that owns `name`.
    ///
    /// `op` receives the backend-local name. Registry failures abort before
    /// `op` runs; `op` failures come back verbatim. Successful results from
    /// a non-default backend are scope-prefixed; `None` and `()` pass
    /// through untouched, and every element of a `Vec` is prefixed.
    pub async fn dispatch<R, F, Fut>(&self, name: &str, op: F) -> GatewayResult<R>
    where
        R: Scoped,
        F: FnOnce(String, Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<R>>,
    {
        let target = self.resolve(name);
        let backend = self.backend_for(target.scope).await?;
        debug!(scope = %backend.scope_id(), local = %target.local, "Dispatching to backend");

        let mut result = op(target.local.to_string(), backend.clone()).await?;
        if let Some(scope) = self.foreign_scope(backend.as_ref()) {
            result.apply_scope(scope);
        }
        Ok(result)
    }

    /// Run `op` against the default backend, without any rewriting.
    /// Used for unscoped resources such as images.
    pub async fn on_default<R, F, Fut>(&self, op: F) -> GatewayResult<R>
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<R>>,
    {
        let backend = self.backend_for(self.registry.default_scope()).await?;
        Ok(op(backend).await?)
    }

    /// Run `op` against every backend concurrently and concatenate the
    /// results in registry order, scope-prefixing items from non-default
    /// backends.
    ///
    /// Fails fast: the first backend error is returned and no partial
    /// results are kept.
    pub async fn aggregate<T, F, Fut>(&self, op: F) -> GatewayResult<Vec<T>>
    where
        T: Identified,
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<Vec<T>>>,
    {
        let mut result = Vec::new();
        for (backend, mut items) in self.fan_out(op).await? {
            if let Some(scope) = self.foreign_scope(backend.as_ref()) {
                items.apply_scope(scope);
            }
            result.extend(items);
        }
        Ok(result)
    }

    /// Like [`Self::aggregate`] but never rewrites names; for per-backend
    /// summaries that are not addressable resources.
    pub async fn aggregate_unnamed<T, F, Fut>(&self, op: F) -> GatewayResult<Vec<T>>
    where
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<Vec<T>>>,
    {
        Ok(self
            .fan_out(op)
            .await?
            .into_iter()
            .flat_map(|(_, items)| items)
            .collect())
    }

    /// Run `op` against every backend; results stay paired with their
    /// backend and in registry order.
    async fn fan_out<T, F, Fut>(&self, op: F) -> GatewayResult<Vec<(Arc<dyn Backend>, Vec<T>)>>
    where
        F: Fn(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = BackendResult<Vec<T>>>,
    {
        let backends = self.list_backends().await?;
        let calls = backends.into_iter().map(|backend| {
            let call = op(backend.clone());
            async move {
                match call.await {
                    Ok(items) => Ok((backend, items)),
                    Err(e) => {
                        debug!(scope = %backend.scope_id(), error = %e, "Backend call failed");
                        Err(e)
                    }
                }
            }
        });
        Ok(try_join_all(calls).await?)
    }

    pub(crate) async fn backend_for(&self, scope: &str) -> GatewayResult<Arc<dyn Backend>> {
        self.registry
            .for_scope(scope)
            .await
            .map_err(|source| GatewayError::Resolution {
                scope: scope.to_string(),
                source,
            })
    }

    pub(crate) async fn list_backends(&self) -> GatewayResult<Vec<Arc<dyn Backend>>> {
        self.registry.list().await.map_err(GatewayError::Listing)
    }

    /// Scope to prefix results with, `None` for the default backend
    pub(crate) fn foreign_scope<'b>(&self, backend: &'b dyn Backend) -> Option<&'b str> {
        let scope = backend.scope_id();
        (scope != self.registry.default_scope()).then_some(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use fedgate_core::{App, BackendError, EventList, EventStreamOptions};

    struct FixedBackend {
        scope: String,
        apps: Vec<&'static str>,
    }

    #[async_trait]
    impl Backend for FixedBackend {
        fn scope_id(&self) -> &str {
            &self.scope
        }

        fn namespace(&self) -> &str {
            "ns"
        }

        async fn app_list(&self) -> BackendResult<Vec<App>> {
            Ok(self
                .apps
                .iter()
                .map(|name| App {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect())
        }

        async fn app_get(&self, name: &str) -> BackendResult<Option<App>> {
            Ok(self.app_list().await?.into_iter().find(|a| a.name == name))
        }

        async fn list_events(&self, _opts: &EventStreamOptions) -> BackendResult<EventList> {
            Ok(EventList::default())
        }
    }

    struct TwoScopes {
        backends: Vec<Arc<dyn Backend>>,
    }

    #[async_trait]
    impl BackendRegistry for TwoScopes {
        async fn for_scope(&self, scope: &str) -> BackendResult<Arc<dyn Backend>> {
            let scope = if scope.is_empty() { "home" } else { scope };
            self.backends
                .iter()
                .find(|b| b.scope_id() == scope)
                .cloned()
                .ok_or_else(|| BackendError::NotFound(scope.to_string()))
        }

        async fn list(&self) -> BackendResult<Vec<Arc<dyn Backend>>> {
            Ok(self.backends.clone())
        }

        fn default_scope(&self) -> &str {
            "home"
        }
    }

    fn gateway() -> FederatedGateway {
        FederatedGateway::new(Arc::new(TwoScopes {
            backends: vec![
                Arc::new(FixedBackend {
                    scope: "home".into(),
                    apps: vec!["web"],
                }),
                Arc::new(FixedBackend {
                    scope: "acme/eu".into(),
                    apps: vec!["db"],
                }),
            ],
        }))
    }

    #[tokio::test]
    async fn dispatch_prefixes_foreign_results() {
        let app: Option<App> = gateway()
            .dispatch("acme/eu/db", |name, b| async move { b.app_get(&name).await })
            .await
            .unwrap();
        assert_eq!(app.unwrap().name, "acme/eu/db");
    }

    #[tokio::test]
    async fn dispatch_leaves_default_results_alone() {
        let app: Option<App> = gateway()
            .dispatch("web", |name, b| async move { b.app_get(&name).await })
            .await
            .unwrap();
        assert_eq!(app.unwrap().name, "web");
    }

    #[tokio::test]
    async fn unknown_scope_never_runs_the_operation() {
        let ran = AtomicBool::new(false);
        let err = gateway()
            .dispatch("nowhere/web", |_name, _b| {
                ran.store(true, Ordering::SeqCst);
                async { Ok(()) }
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Resolution { ref scope, .. } if scope == "nowhere"));
        assert!(!ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn aggregate_keeps_registry_order() {
        let apps = gateway()
            .aggregate(|b| async move { b.app_list().await })
            .await
            .unwrap();
        let names: Vec<_> = apps.into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["web", "acme/eu/db"]);
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let registry = gateway().registry;
        let result = FederatedGateway::with_config(registry, GatewayConfig { event_buffer: 0 });
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}

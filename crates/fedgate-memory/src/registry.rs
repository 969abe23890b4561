//! Ordered, in-process backend registry

use std::sync::Arc;

use async_trait::async_trait;
use fedgate_core::{Backend, BackendError, BackendRegistry, BackendResult};
use parking_lot::RwLock;
use tracing::info;

use crate::backend::MemoryBackend;
use crate::config::{ConfigError, RegistryConfig};

/// Registry holding backends in registration order
pub struct StaticRegistry {
    default_scope: String,
    backends: RwLock<Vec<Arc<dyn Backend>>>,
}

impl StaticRegistry {
    pub fn new(default_scope: impl Into<String>) -> Self {
        Self {
            default_scope: default_scope.into(),
            backends: RwLock::new(Vec::new()),
        }
    }

    /// Build a registry of [`MemoryBackend`]s from configuration
    pub fn from_config(config: &RegistryConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let default_scope = config
            .resolved_default_scope()
            .ok_or_else(|| ConfigError::Invalid("no default scope".to_string()))?;

        let registry = Self::new(default_scope);
        for scope in &config.scopes {
            registry.register(Arc::new(MemoryBackend::from_config(scope)));
        }
        Ok(registry)
    }

    /// Builder-style [`Self::register`]
    pub fn with_backend(self, backend: Arc<dyn Backend>) -> Self {
        self.register(backend);
        self
    }

    /// Add a backend. A backend with the same scope is replaced in place,
    /// keeping its position.
    pub fn register(&self, backend: Arc<dyn Backend>) {
        let scope = backend.scope_id().to_string();
        let mut backends = self.backends.write();
        match backends.iter_mut().find(|b| b.scope_id() == scope) {
            Some(slot) => {
                *slot = backend;
                info!(scope = %scope, "Replaced backend");
            }
            None => {
                backends.push(backend);
                info!(scope = %scope, "Registered backend");
            }
        }
    }

    pub fn unregister(&self, scope: &str) -> Option<Arc<dyn Backend>> {
        let mut backends = self.backends.write();
        let index = backends.iter().position(|b| b.scope_id() == scope)?;
        info!(scope = %scope, "Unregistered backend");
        Some(backends.remove(index))
    }

    /// Registered scopes, in order
    pub fn scope_ids(&self) -> Vec<String> {
        self.backends
            .read()
            .iter()
            .map(|b| b.scope_id().to_string())
            .collect()
    }
}

#[async_trait]
impl BackendRegistry for StaticRegistry {
    async fn for_scope(&self, scope: &str) -> BackendResult<Arc<dyn Backend>> {
        let scope = if scope.is_empty() {
            self.default_scope.as_str()
        } else {
            scope
        };
        self.backends
            .read()
            .iter()
            .find(|b| b.scope_id() == scope)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(format!("scope {}", scope)))
    }

    async fn list(&self) -> BackendResult<Vec<Arc<dyn Backend>>> {
        Ok(self.backends.read().clone())
    }

    fn default_scope(&self) -> &str {
        &self.default_scope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry() -> StaticRegistry {
        StaticRegistry::new("home")
            .with_backend(Arc::new(MemoryBackend::new("home", "default")))
            .with_backend(Arc::new(MemoryBackend::new("acme/eu", "acme")))
    }

    #[tokio::test]
    async fn empty_scope_resolves_to_default() {
        let backend = registry().for_scope("").await.unwrap();
        assert_eq!(backend.scope_id(), "home");
    }

    #[tokio::test]
    async fn unknown_scope_is_not_found() {
        let err = registry().for_scope("nope").await.err().unwrap();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_keeps_registration_order() {
        let scopes: Vec<_> = registry()
            .list()
            .await
            .unwrap()
            .iter()
            .map(|b| b.scope_id().to_string())
            .collect();
        assert_eq!(scopes, vec!["home", "acme/eu"]);
    }

    #[tokio::test]
    async fn re_register_replaces_in_place() {
        let reg = registry();
        reg.register(Arc::new(MemoryBackend::new("home", "other")));
        assert_eq!(reg.scope_ids(), vec!["home", "acme/eu"]);
        assert_eq!(reg.for_scope("home").await.unwrap().namespace(), "other");
    }

    #[test]
    fn unregister_removes_scope() {
        let reg = registry();
        assert!(reg.unregister("acme/eu").is_some());
        assert!(reg.unregister("acme/eu").is_none());
        assert_eq!(reg.scope_ids(), vec!["home"]);
    }

    #[test]
    fn from_config_uses_first_scope_as_default() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [[scope]]
            id = "local"

            [[scope]]
            id = "acme/eu"
            namespace = "acme"
            "#,
        )
        .unwrap();
        let reg = StaticRegistry::from_config(&config).unwrap();
        assert_eq!(reg.default_scope(), "local");
        assert_eq!(reg.scope_ids(), vec!["local", "acme/eu"]);
    }
}

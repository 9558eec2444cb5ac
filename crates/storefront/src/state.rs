//! Application state shared across handlers.

use std::sync::Arc;

use wildthread_core::store::DocumentStore;

use crate::backend::Backend;
use crate::catalog::ProductCatalog;
use crate::config::StorefrontConfig;
use crate::services::AuthService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configured backend, the catalog cache and the auth service.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: Backend,
    catalog: ProductCatalog,
    auth: AuthService,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = Backend::from_config(&config.backend);
        let catalog = ProductCatalog::new(backend.documents.clone());
        let auth = AuthService::new(backend.auth.clone(), backend.documents.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                catalog,
                auth,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a handle to the document store capability.
    #[must_use]
    pub fn documents(&self) -> Arc<dyn DocumentStore> {
        self.inner.backend.documents.clone()
    }

    /// Get a reference to the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &ProductCatalog {
        &self.inner.catalog
    }

    /// Get a reference to the authentication service.
    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }
}

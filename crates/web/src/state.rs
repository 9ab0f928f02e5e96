//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{ApiError, BackendClient};
use crate::catalog::Catalog;
use crate::config::WebConfig;
use crate::services::{OrderService, ProjectionCache, SessionService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and gives access to the
/// backend client, the catalog and the caching services built on them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: WebConfig,
    backend: BackendClient,
    catalog: Catalog,
    sessions: SessionService,
    orders: OrderService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: WebConfig, catalog: Catalog) -> Result<Self, ApiError> {
        let backend = BackendClient::new(&config.backend)?;
        let sessions = SessionService::new(backend.clone(), config.identity_ttl);
        let orders = OrderService::new(
            backend.clone(),
            ProjectionCache::new(config.projection_ttl),
            config.pricing.clone(),
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                catalog,
                sessions,
                orders,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionService {
        &self.inner.sessions
    }

    #[must_use]
    pub fn orders(&self) -> &OrderService {
        &self.inner.orders
    }
}

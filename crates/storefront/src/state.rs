//! Application state shared across handlers.

use std::sync::Arc;

use hearth_core::api::BackendError;

use crate::backend::StorefrontClient;
use crate::config::StorefrontConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds read-only configuration and the
/// pooled backend client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: StorefrontClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is unusable.
    pub fn new(config: StorefrontConfig) -> Result<Self, BackendError> {
        let backend = StorefrontClient::new(&config.api)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the backend client.
    #[must_use]
    pub fn backend(&self) -> &StorefrontClient {
        &self.inner.backend
    }
}

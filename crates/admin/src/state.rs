//! Application state shared across handlers.

use std::sync::Arc;

use hearth_core::api::BackendError;

use crate::backend::AdminClient;
use crate::config::AdminConfig;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backend: AdminClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend URL is unusable.
    pub fn new(config: AdminConfig) -> Result<Self, BackendError> {
        let backend = AdminClient::new(&config)?;

        Ok(Self {
            inner: Arc::new(AppStateInner { config, backend }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &AdminClient {
        &self.inner.backend
    }
}

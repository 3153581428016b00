//! Application state - shared across all handlers.

use std::sync::Arc;

use folio_core::StoreError;
use folio_core::ports::PostRepository;
use folio_infra::store::{self, ConfigError, ConnectError, StoreConfig};
use folio_infra::{DocumentPostRepository, OfflinePostRepository};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<dyn PostRepository>,
    /// Store backend name, `unconfigured` or `unreachable`.
    pub backend: &'static str,
}

impl AppState {
    /// Connect the configured document store.
    ///
    /// Without a usable configuration every post operation reports "not
    /// configured" (503). A configured store that cannot be reached reports
    /// its connection error on every operation (502) instead.
    pub async fn new(store_config: Result<&StoreConfig, &ConfigError>) -> Self {
        let state = match store_config {
            Ok(config) => match store::connect(config).await {
                Ok(store) => {
                    let backend = store.backend();
                    Self::with_repository(Arc::new(DocumentPostRepository::new(store)), backend)
                }
                Err(ConnectError::Config(e)) => {
                    tracing::warn!(error = %e, "Document store configuration rejected. Post routes will answer 503.");
                    Self::unconfigured(e.to_string())
                }
                Err(ConnectError::Store(e)) => {
                    tracing::error!(error = %e, "Failed to connect document store. Post routes will answer 502.");
                    Self::unreachable(e)
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "Document store not configured. Post routes will answer 503.");
                Self::unconfigured(e.to_string())
            }
        };

        tracing::info!(backend = state.backend, "Application state initialized");
        state
    }

    pub fn with_repository(posts: Arc<dyn PostRepository>, backend: &'static str) -> Self {
        Self { posts, backend }
    }

    pub fn unconfigured(reason: impl Into<String>) -> Self {
        Self::with_repository(
            Arc::new(OfflinePostRepository::not_configured(reason)),
            "unconfigured",
        )
    }

    pub fn unreachable(error: StoreError) -> Self {
        Self::with_repository(
            Arc::new(OfflinePostRepository::unreachable(error)),
            "unreachable",
        )
    }
}

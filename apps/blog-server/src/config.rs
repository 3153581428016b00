//! Application configuration loaded from environment variables.

use std::env;

use folio_infra::store::{ConfigError, StoreConfig};

#[cfg(feature = "auth")]
use crate::middleware::auth::OwnerPolicy;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// A missing store URL is not fatal: the server runs in unconfigured
    /// mode and answers 503 on every post route.
    pub store: Result<StoreConfig, ConfigError>,
    /// `OWNER_EMAILS`, comma-separated. Empty admits any valid token.
    #[cfg(feature = "auth")]
    pub owners: OwnerPolicy,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            store: StoreConfig::from_env(),
            #[cfg(feature = "auth")]
            owners: OwnerPolicy::parse(&env::var("OWNER_EMAILS").unwrap_or_default()),
        }
    }
}

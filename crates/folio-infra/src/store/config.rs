//! Store configuration and connection.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use folio_core::StoreError;
use folio_core::ports::DocumentStore;

use super::InMemoryDocumentStore;

pub const STORE_URL_VAR: &str = "FOLIO_STORE_URL";

/// Problems found while reading store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("Unsupported store URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Which adapter a store URL selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Redis { url: String },
}

/// Document store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// `memory://` or `redis://...` / `rediss://...`.
    pub url: String,
    /// Key prefix isolating this blog's data on a shared backend.
    pub namespace: String,
    pub connect_timeout: Duration,
    /// Snapshots buffered per live query before the watcher waits.
    pub subscription_buffer: usize,
}

impl StoreConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            namespace: "folio".to_string(),
            connect_timeout: Duration::from_secs(5),
            subscription_buffer: 64,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// A missing or blank `FOLIO_STORE_URL` is reported as
    /// [`ConfigError::Missing`]; callers treat that as "not configured".
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(STORE_URL_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing(STORE_URL_VAR))?;

        let mut config = Self::new(url);
        if let Some(namespace) = lookup("FOLIO_STORE_NAMESPACE").filter(|v| !v.trim().is_empty()) {
            config.namespace = namespace.trim().to_string();
        }
        if let Some(raw) = lookup("FOLIO_STORE_CONNECT_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "FOLIO_STORE_CONNECT_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup("FOLIO_SUBSCRIPTION_BUFFER") {
            config.subscription_buffer = raw
                .trim()
                .parse()
                .ok()
                .filter(|n: &usize| *n > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    key: "FOLIO_SUBSCRIPTION_BUFFER",
                    value: raw.clone(),
                })?;
        }

        config.backend()?;
        Ok(config)
    }

    pub fn backend(&self) -> Result<StoreBackend, ConfigError> {
        let scheme = self.url.split_once("://").map(|(scheme, _)| scheme);
        match scheme {
            Some("memory") => Ok(StoreBackend::Memory),
            Some("redis") | Some("rediss") => Ok(StoreBackend::Redis {
                url: self.url.clone(),
            }),
            _ => Err(ConfigError::UnsupportedScheme(self.url.clone())),
        }
    }
}

/// Error from [`connect`].
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Build the document store a configuration describes.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, ConnectError> {
    match config.backend()? {
        StoreBackend::Memory => {
            tracing::info!("Using in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new(config.subscription_buffer)))
        }
        #[cfg(feature = "redis")]
        StoreBackend::Redis { url } => {
            let store = super::RedisDocumentStore::connect(
                &url,
                &config.namespace,
                config.connect_timeout,
                config.subscription_buffer,
            )
            .await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        StoreBackend::Redis { .. } => Err(ConfigError::UnsupportedScheme(format!(
            "{} (built without the redis feature)",
            config.url
        ))
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_url_is_not_configured() {
        let err = StoreConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_URL_VAR));

        let err = StoreConfig::from_lookup(lookup(&[(STORE_URL_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(STORE_URL_VAR));
    }

    #[test]
    fn test_reads_overrides() {
        let config = StoreConfig::from_lookup(lookup(&[
            (STORE_URL_VAR, "redis://cache:6379"),
            ("FOLIO_STORE_NAMESPACE", "blog"),
            ("FOLIO_STORE_CONNECT_TIMEOUT_SECS", "2"),
            ("FOLIO_SUBSCRIPTION_BUFFER", "8"),
        ]))
        .unwrap();

        assert_eq!(config.namespace, "blog");
        assert_eq!(config.connect_timeout, Duration::from_secs(2));
        assert_eq!(config.subscription_buffer, 8);
        assert_eq!(
            config.backend().unwrap(),
            StoreBackend::Redis {
                url: "redis://cache:6379".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = StoreConfig::from_lookup(lookup(&[(STORE_URL_VAR, "postgres://db")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(_)));

        let err = StoreConfig::from_lookup(lookup(&[
            (STORE_URL_VAR, "memory://"),
            ("FOLIO_SUBSCRIPTION_BUFFER", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "FOLIO_SUBSCRIPTION_BUFFER", .. }));
    }

    #[tokio::test]
    async fn test_connect_memory() {
        let store = connect(&StoreConfig::new("memory://")).await.unwrap();
        assert_eq!(store.backend(), "memory");
    }
}

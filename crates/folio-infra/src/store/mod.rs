//! Document store implementations - Redis and in-memory.

mod config;
mod memory;

pub use config::{ConfigError, ConnectError, STORE_URL_VAR, StoreBackend, StoreConfig, connect};
pub use memory::InMemoryDocumentStore;

#[cfg(feature = "redis")]
mod redis;
#[cfg(feature = "redis")]
pub use self::redis::RedisDocumentStore;

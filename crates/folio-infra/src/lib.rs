//! # Folio Infrastructure
//!
//! Concrete implementations of the ports defined in `folio-core`.
//! This crate contains the document store adapters and the post repository.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external services, in-memory store only
//! - `auth` - JWT verification for administrative writes
//! - `redis` - Redis-backed document store with pub/sub change feeds

pub mod repository;
pub mod store;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use repository::{DocumentPostRepository, OfflinePostRepository};
pub use store::{InMemoryDocumentStore, StoreConfig};

#[cfg(feature = "auth")]
pub use auth::{JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use store::RedisDocumentStore;

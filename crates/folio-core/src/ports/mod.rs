//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod document_store;
mod repository;
mod subscription;

pub use auth::{AuthError, TokenClaims, TokenService};
pub use document_store::{DocumentStore, SnapshotStream};
pub use repository::PostRepository;
pub use subscription::Subscription;

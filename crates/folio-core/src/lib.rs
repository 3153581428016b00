//! # Folio Core
//!
//! The domain layer of Folio.
//! This crate contains the post model, the document query model, the ports
//! infrastructure implements, and the pure search and grouping logic.

pub mod document;
pub mod domain;
pub mod error;
pub mod ports;
pub mod search;
pub mod taxonomy;

pub use error::{DomainError, RepoError, StoreError};

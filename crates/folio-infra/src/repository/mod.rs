//! Post repository implementations.

pub mod codec;
mod posts;
mod offline;

pub use posts::DocumentPostRepository;
pub use offline::OfflinePostRepository;

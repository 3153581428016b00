//! Document model shared by every store adapter.
//!
//! Adapters evaluate queries with the same rules, so filtering and ordering
//! live here rather than in each backend.

mod query;
mod value;

pub use query::{ChangeEvent, Direction, Filter, OrderBy, Query};
pub use value::{Document, DocumentId, Fields, Value};

//! Domain entities - the core business objects.

mod locale;
mod post;
mod timestamp;

pub use locale::Locale;
pub use post::{NewPost, Post, PostId, PostPatch, normalize_category, normalize_tags};
pub use timestamp::Timestamp;

use async_trait::async_trait;

use super::Subscription;
use crate::domain::{Locale, NewPost, Post, PostId, PostPatch};
use crate::error::RepoError;

/// Post repository.
///
/// Implementations do no editorial validation and do not enforce slug
/// uniqueness; callers own both.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a post; the store assigns the id.
    async fn create(&self, input: NewPost) -> Result<PostId, RepoError>;

    /// Merge the supplied fields and stamp `updatedAt`.
    async fn update(&self, id: &PostId, patch: PostPatch) -> Result<(), RepoError>;

    /// Delete by id. Idempotent.
    async fn delete(&self, id: &PostId) -> Result<(), RepoError>;

    /// First post with this slug, optionally restricted to one locale.
    async fn get_by_slug(&self, slug: &str, locale: Option<Locale>)
    -> Result<Option<Post>, RepoError>;

    /// One-shot, newest first.
    async fn list_posts(&self, locale: Locale) -> Result<Vec<Post>, RepoError>;

    /// Live feed of a locale, newest first.
    async fn subscribe_to_all(&self, locale: Locale) -> Result<Subscription<Vec<Post>>, RepoError>;

    /// Live view of a single post; `None` while nothing matches.
    async fn subscribe_to_one(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<Subscription<Option<Post>>, RepoError>;

    /// Live feed of one category in a locale, newest first.
    async fn subscribe_by_category(
        &self,
        category: &str,
        locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError>;

    /// Live feed of one tag in a locale, newest first.
    async fn subscribe_by_tag(
        &self,
        tag: &str,
        locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError>;

    /// Distinct categories, sorted.
    async fn list_categories(&self, locale: Option<Locale>) -> Result<Vec<String>, RepoError>;

    /// Distinct tags, sorted.
    async fn list_tags(&self, locale: Option<Locale>) -> Result<Vec<String>, RepoError>;

    /// Case-insensitive substring search within one locale.
    async fn search(&self, term: &str, locale: Locale) -> Result<Vec<Post>, RepoError>;
}

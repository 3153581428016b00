//! Repository used when no document store is available.

use async_trait::async_trait;

use folio_core::domain::{Locale, NewPost, Post, PostId, PostPatch};
use folio_core::ports::{PostRepository, Subscription};
use folio_core::{RepoError, StoreError};

/// Refuses every operation with one fixed error, without attempting any I/O.
///
/// [`OfflinePostRepository::not_configured`] stands in when no backend is set
/// up and lets callers tell "no backend" apart from "no posts".
/// [`OfflinePostRepository::unreachable`] stands in when the configured store
/// could not be reached and reports that failure as a store error.
#[derive(Debug, Clone)]
pub struct OfflinePostRepository {
    error: RepoError,
}

impl OfflinePostRepository {
    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self {
            error: RepoError::NotConfigured(reason.into()),
        }
    }

    pub fn unreachable(error: StoreError) -> Self {
        Self {
            error: RepoError::Store(error),
        }
    }

    fn refuse<T>(&self) -> Result<T, RepoError> {
        Err(self.error.clone())
    }

    fn refuse_write<T>(&self) -> Result<T, RepoError> {
        tracing::warn!(error = %self.error, "Document store unavailable - refusing write");
        self.refuse()
    }
}

#[async_trait]
impl PostRepository for OfflinePostRepository {
    async fn create(&self, _input: NewPost) -> Result<PostId, RepoError> {
        self.refuse_write()
    }

    async fn update(&self, _id: &PostId, _patch: PostPatch) -> Result<(), RepoError> {
        self.refuse_write()
    }

    async fn delete(&self, _id: &PostId) -> Result<(), RepoError> {
        self.refuse_write()
    }

    async fn get_by_slug(
        &self,
        _slug: &str,
        _locale: Option<Locale>,
    ) -> Result<Option<Post>, RepoError> {
        self.refuse()
    }

    async fn list_posts(&self, _locale: Locale) -> Result<Vec<Post>, RepoError> {
        self.refuse()
    }

    async fn subscribe_to_all(
        &self,
        _locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.refuse()
    }

    async fn subscribe_to_one(
        &self,
        _locale: Locale,
        _slug: &str,
    ) -> Result<Subscription<Option<Post>>, RepoError> {
        self.refuse()
    }

    async fn subscribe_by_category(
        &self,
        _category: &str,
        _locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.refuse()
    }

    async fn subscribe_by_tag(
        &self,
        _tag: &str,
        _locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.refuse()
    }

    async fn list_categories(&self, _locale: Option<Locale>) -> Result<Vec<String>, RepoError> {
        self.refuse()
    }

    async fn list_tags(&self, _locale: Option<Locale>) -> Result<Vec<String>, RepoError> {
        self.refuse()
    }

    async fn search(&self, _term: &str, _locale: Locale) -> Result<Vec<Post>, RepoError> {
        self.refuse()
    }
}

//! Post repository over a document store.

use std::sync::Arc;

use async_trait::async_trait;

use folio_core::RepoError;
use folio_core::document::{Direction, Query};
use folio_core::domain::{Locale, NewPost, Post, PostId, PostPatch, Timestamp};
use folio_core::ports::{DocumentStore, PostRepository, Subscription};
use folio_core::{search, taxonomy};

use super::codec::{self, POSTS, field};

/// Post repository backed by any [`DocumentStore`].
///
/// A thin translation layer: store errors come back unchanged and nothing is
/// retried.
#[derive(Clone)]
pub struct DocumentPostRepository {
    store: Arc<dyn DocumentStore>,
}

impl DocumentPostRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    fn locale_query(locale: Option<Locale>) -> Query {
        let query = Query::collection(POSTS);
        match locale {
            Some(locale) => query.where_eq(field::LOCALE, locale.as_str()),
            None => query,
        }
    }

    fn feed_query(locale: Locale) -> Query {
        Self::locale_query(Some(locale)).order_by(field::PUBLISHED_AT, Direction::Descending)
    }

    /// No store-side limit: an undecodable match sorting first must not hide
    /// a valid post behind it. Callers keep the first decoded one.
    fn slug_query(slug: &str, locale: Option<Locale>) -> Query {
        Self::locale_query(locale).where_eq(field::SLUG, slug)
    }

    async fn fetch(&self, query: &Query) -> Result<Vec<Post>, RepoError> {
        let docs = self.store.query(query).await?;
        Ok(codec::decode_posts(docs))
    }

    async fn watch_feed(&self, query: Query) -> Result<Subscription<Vec<Post>>, RepoError> {
        tracing::debug!(query = %query, "Opening live feed");
        let snapshots = self.store.watch(query).await?;
        Ok(snapshots
            .map_snapshots(codec::decode_posts)
            .map_err(RepoError::from))
    }
}

#[async_trait]
impl PostRepository for DocumentPostRepository {
    async fn create(&self, input: NewPost) -> Result<PostId, RepoError> {
        let slug = input.slug.clone();
        let locale = input.locale;
        let fields = codec::encode_new_post(input, Timestamp::now());

        let id = self.store.add(POSTS, fields).await?;
        tracing::info!(id = %id, slug = %slug, locale = %locale, "Post created");
        Ok(PostId::new(id))
    }

    async fn update(&self, id: &PostId, patch: PostPatch) -> Result<(), RepoError> {
        let fields = codec::encode_patch(patch, Timestamp::now());
        self.store.merge(POSTS, id.as_str(), fields).await?;
        tracing::info!(id = %id, "Post updated");
        Ok(())
    }

    async fn delete(&self, id: &PostId) -> Result<(), RepoError> {
        self.store.delete(POSTS, id.as_str()).await?;
        tracing::info!(id = %id, "Post deleted");
        Ok(())
    }

    async fn get_by_slug(
        &self,
        slug: &str,
        locale: Option<Locale>,
    ) -> Result<Option<Post>, RepoError> {
        let posts = self.fetch(&Self::slug_query(slug, locale)).await?;
        Ok(posts.into_iter().next())
    }

    async fn list_posts(&self, locale: Locale) -> Result<Vec<Post>, RepoError> {
        self.fetch(&Self::feed_query(locale)).await
    }

    async fn subscribe_to_all(&self, locale: Locale) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.watch_feed(Self::feed_query(locale)).await
    }

    async fn subscribe_to_one(
        &self,
        locale: Locale,
        slug: &str,
    ) -> Result<Subscription<Option<Post>>, RepoError> {
        let feed = self.watch_feed(Self::slug_query(slug, Some(locale))).await?;
        Ok(feed.map_snapshots(|posts| posts.into_iter().next()))
    }

    async fn subscribe_by_category(
        &self,
        category: &str,
        locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.watch_feed(Self::feed_query(locale).where_eq(field::CATEGORY, category))
            .await
    }

    async fn subscribe_by_tag(
        &self,
        tag: &str,
        locale: Locale,
    ) -> Result<Subscription<Vec<Post>>, RepoError> {
        self.watch_feed(Self::feed_query(locale).where_array_contains(field::TAGS, tag))
            .await
    }

    async fn list_categories(&self, locale: Option<Locale>) -> Result<Vec<String>, RepoError> {
        let posts = self.fetch(&Self::locale_query(locale)).await?;
        Ok(taxonomy::distinct_categories(&posts))
    }

    async fn list_tags(&self, locale: Option<Locale>) -> Result<Vec<String>, RepoError> {
        let posts = self.fetch(&Self::locale_query(locale)).await?;
        Ok(taxonomy::distinct_tags(&posts))
    }

    async fn search(&self, term: &str, locale: Locale) -> Result<Vec<Post>, RepoError> {
        let posts = self.fetch(&Self::feed_query(locale)).await?;
        let found = search::filter_posts(posts, term);
        tracing::debug!(locale = %locale, results = found.len(), "Search finished");
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use folio_core::StoreError;
    use folio_core::document::{Document, DocumentId, Fields, Value};
    use folio_core::ports::SnapshotStream;

    use crate::store::InMemoryDocumentStore;

    fn repo() -> DocumentPostRepository {
        DocumentPostRepository::new(Arc::new(InMemoryDocumentStore::default()))
    }

    fn draft(slug: &str, locale: Locale) -> NewPost {
        NewPost::new(format!("Title {slug}"), slug, "summary", "content", locale)
    }

    async fn next<T>(sub: &mut Subscription<T>) -> T
    where
        T: Send + 'static,
    {
        tokio::time::timeout(Duration::from_secs(1), sub.next_snapshot())
            .await
            .expect("snapshot in time")
            .expect("feed open")
            .expect("snapshot ok")
    }

    async fn expect_quiet<T>(sub: &mut Subscription<T>)
    where
        T: Send + std::fmt::Debug + 'static,
    {
        let next = tokio::time::timeout(Duration::from_millis(50), sub.next_snapshot()).await;
        assert!(next.is_err(), "unexpected snapshot: {next:?}");
    }

    fn slugs(posts: &[Post]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[tokio::test]
    async fn test_create_then_get_by_slug() {
        let repo = repo();
        let input = draft("hello", Locale::En)
            .with_category("notes")
            .with_tags(["rust", "async"])
            .with_cover_image("/cover.png");
        let id = repo.create(input.clone()).await.unwrap();

        let post = repo.get_by_slug("hello", Some(Locale::En)).await.unwrap().unwrap();
        assert_eq!(post.id, id);
        assert_eq!(post.title, input.title);
        assert_eq!(post.summary, input.summary);
        assert_eq!(post.content, input.content);
        assert_eq!(post.cover_image, input.cover_image);
        assert_eq!(post.category, input.category);
        assert_eq!(post.tags, input.tags);
        assert_eq!(post.locale, Locale::En);

        assert!(repo.get_by_slug("hello", Some(Locale::Fr)).await.unwrap().is_none());
        assert!(repo.get_by_slug("missing", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_by_slug_without_locale_matches_any() {
        let repo = repo();
        repo.create(draft("bonjour", Locale::Fr)).await.unwrap();

        let post = repo.get_by_slug("bonjour", None).await.unwrap().unwrap();
        assert_eq!(post.locale, Locale::Fr);
    }

    #[tokio::test]
    async fn test_get_by_slug_skips_malformed_match() {
        let store = Arc::new(InMemoryDocumentStore::default());
        let legacy = Fields::from([
            (field::SLUG.to_string(), Value::from("hello")),
            (field::LOCALE.to_string(), Value::from("de")),
        ]);
        store.merge(POSTS, "0000-legacy", legacy).await.unwrap();

        let repo = DocumentPostRepository::new(store);
        let id = repo.create(draft("hello", Locale::En)).await.unwrap();

        let post = repo.get_by_slug("hello", None).await.unwrap().unwrap();
        assert_eq!(post.id, id);

        let mut watch = repo.subscribe_to_one(Locale::En, "hello").await.unwrap();
        assert_eq!(next(&mut watch).await.map(|p| p.id), Some(id));
    }

    #[tokio::test]
    async fn test_update_merges_supplied_fields() {
        let repo = repo();
        let id = repo
            .create(draft("merge", Locale::En).with_tags(["keep"]))
            .await
            .unwrap();

        repo.update(
            &id,
            PostPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let post = repo.get_by_slug("merge", Some(Locale::En)).await.unwrap().unwrap();
        assert_eq!(post.title, "Renamed");
        assert_eq!(post.summary, "summary");
        assert_eq!(post.content, "content");
        assert_eq!(post.tags, Some(vec!["keep".to_string()]));
        assert!(post.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_update_can_clear_tags_and_category() {
        let repo = repo();
        let id = repo
            .create(draft("clear", Locale::En).with_tags(["x"]).with_category("c"))
            .await
            .unwrap();

        repo.update(
            &id,
            PostPatch {
                tags: Some(vec![]),
                category: Some(String::new()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let post = repo.get_by_slug("clear", None).await.unwrap().unwrap();
        assert_eq!(post.tags, None);
        assert_eq!(post.category, None);
    }

    #[tokio::test]
    async fn test_update_unknown_id_upserts_silently() {
        let repo = repo();
        repo.update(
            &PostId::new("nope"),
            PostPatch {
                title: Some("Orphan".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        // The upserted document has no slug or locale, so it is not a post.
        assert!(repo.list_posts(Locale::En).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let repo = repo();
        let id = repo.create(draft("gone", Locale::En)).await.unwrap();

        repo.delete(&id).await.unwrap();
        repo.delete(&id).await.unwrap();
        assert!(repo.get_by_slug("gone", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_slugs_are_accepted() {
        let repo = repo();
        let first = repo.create(draft("twin", Locale::En)).await.unwrap();
        let second = repo.create(draft("twin", Locale::En)).await.unwrap();
        assert_ne!(first, second);

        let found = repo.get_by_slug("twin", Some(Locale::En)).await.unwrap().unwrap();
        assert_eq!(found.id, first.clone().min(second));
    }

    #[tokio::test]
    async fn test_feed_delivers_newest_first() {
        let repo = repo();
        let t = 1_700_000_000;
        for (slug, offset) in [("t0", 0), ("t1", 1), ("t2", 2)] {
            repo.create(draft(slug, Locale::En).published_at(Timestamp::from_seconds(t + offset)))
                .await
                .unwrap();
        }

        let mut feed = repo.subscribe_to_all(Locale::En).await.unwrap();
        assert_eq!(slugs(&next(&mut feed).await), vec!["t2", "t1", "t0"]);
    }

    #[tokio::test]
    async fn test_feed_fires_for_own_locale_only() {
        let repo = repo();
        repo.create(draft("existing", Locale::En)).await.unwrap();

        let mut feed = repo.subscribe_to_all(Locale::En).await.unwrap();
        assert_eq!(slugs(&next(&mut feed).await), vec!["existing"]);

        let other = repo.create(draft("ailleurs", Locale::Fr)).await.unwrap();
        repo.update(
            &other,
            PostPatch {
                title: Some("Toujours ailleurs".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        repo.delete(&other).await.unwrap();
        expect_quiet(&mut feed).await;

        let id = repo
            .create(draft("fresh", Locale::En).published_at(Timestamp::now()))
            .await
            .unwrap();
        assert_eq!(next(&mut feed).await.len(), 2);

        repo.update(
            &id,
            PostPatch {
                summary: Some("edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let snapshot = next(&mut feed).await;
        assert!(snapshot.iter().any(|p| p.summary == "edited"));

        repo.delete(&id).await.unwrap();
        assert_eq!(slugs(&next(&mut feed).await), vec!["existing"]);
    }

    #[tokio::test]
    async fn test_subscribe_to_one_emits_none_until_created() {
        let repo = repo();
        let mut watch = repo.subscribe_to_one(Locale::Zh, "ni-hao").await.unwrap();
        assert!(next(&mut watch).await.is_none());

        // Same slug, other locale: not this post.
        repo.create(draft("ni-hao", Locale::En)).await.unwrap();
        expect_quiet(&mut watch).await;

        let id = repo.create(draft("ni-hao", Locale::Zh)).await.unwrap();
        let post = next(&mut watch).await.unwrap();
        assert_eq!(post.id, id);

        repo.delete(&id).await.unwrap();
        assert!(next(&mut watch).await.is_none());
    }

    #[tokio::test]
    async fn test_category_and_tag_feeds() {
        let repo = repo();
        repo.create(draft("a", Locale::En).with_category("rust").with_tags(["async"]))
            .await
            .unwrap();
        repo.create(draft("b", Locale::En).with_category("life").with_tags(["async", "tea"]))
            .await
            .unwrap();
        repo.create(draft("c", Locale::Fr).with_category("rust").with_tags(["async"]))
            .await
            .unwrap();

        let mut by_category = repo.subscribe_by_category("rust", Locale::En).await.unwrap();
        assert_eq!(slugs(&next(&mut by_category).await), vec!["a"]);

        let mut by_tag = repo.subscribe_by_tag("async", Locale::En).await.unwrap();
        let mut tagged = slugs(&next(&mut by_tag).await)
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        tagged.sort();
        assert_eq!(tagged, vec!["a", "b"]);

        repo.create(draft("d", Locale::En).with_tags(["tea"]))
            .await
            .unwrap();
        expect_quiet(&mut by_tag).await;
        expect_quiet(&mut by_category).await;
    }

    #[tokio::test]
    async fn test_category_and_tag_feeds_follow_matching_writes() {
        let repo = repo();
        let mut by_category = repo.subscribe_by_category("rust", Locale::En).await.unwrap();
        let mut by_tag = repo.subscribe_by_tag("async", Locale::En).await.unwrap();
        assert!(next(&mut by_category).await.is_empty());
        assert!(next(&mut by_tag).await.is_empty());

        let id = repo
            .create(draft("a", Locale::En).with_category("rust").with_tags(["async", "tea"]))
            .await
            .unwrap();
        assert_eq!(slugs(&next(&mut by_category).await), vec!["a"]);
        assert_eq!(slugs(&next(&mut by_tag).await), vec!["a"]);

        // Dropping the tag empties the tag feed; the category feed sees the edit.
        repo.update(
            &id,
            PostPatch {
                tags: Some(vec!["tea".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(next(&mut by_tag).await.is_empty());
        let snapshot = next(&mut by_category).await;
        assert_eq!(snapshot[0].tags, Some(vec!["tea".to_string()]));

        repo.delete(&id).await.unwrap();
        assert!(next(&mut by_category).await.is_empty());
        expect_quiet(&mut by_tag).await;
    }

    #[tokio::test]
    async fn test_list_tags_and_categories() {
        let repo = repo();
        repo.create(draft("1", Locale::En).with_tags(["a", "B"]).with_category("Zeta"))
            .await
            .unwrap();
        repo.create(draft("2", Locale::En).with_tags(["b"]).with_category("alpha"))
            .await
            .unwrap();
        repo.create(draft("3", Locale::En).with_tags(Vec::<String>::new()))
            .await
            .unwrap();
        repo.create(draft("4", Locale::Es).with_tags(["solo"]).with_category("uno"))
            .await
            .unwrap();

        assert_eq!(repo.list_tags(Some(Locale::En)).await.unwrap(), vec!["B", "a", "b"]);
        assert_eq!(
            repo.list_categories(Some(Locale::En)).await.unwrap(),
            vec!["Zeta", "alpha"]
        );
        assert_eq!(repo.list_categories(None).await.unwrap(), vec!["Zeta", "alpha", "uno"]);
    }

    #[tokio::test]
    async fn test_search_fixture() {
        let repo = repo();
        let fixtures = [
            ("s1", "Firebase未配置 guide", "body"),
            ("s2", "Unrelated", "nothing"),
            ("s3", "Deploy notes", "seeing FIREBASE未配置 again"),
            ("s4", "Firebase", "configured fine"),
            ("s5", "Misc", "text"),
        ];
        for (i, (slug, title, content)) in fixtures.into_iter().enumerate() {
            repo.create(
                NewPost::new(title, slug, "", content, Locale::Zh)
                    .published_at(Timestamp::from_seconds(i as i64)),
            )
            .await
            .unwrap();
        }
        repo.create(NewPost::new("firebase未配置", "other-locale", "", "", Locale::En))
            .await
            .unwrap();

        let found = repo.search("firebase未配置", Locale::Zh).await.unwrap();
        assert_eq!(slugs(&found), vec!["s3", "s1"]);
        assert!(repo.search("  ", Locale::Zh).await.unwrap().is_empty());
    }

    /// A store that refuses every call, to check errors pass through.
    struct DownStore;

    #[async_trait]
    impl DocumentStore for DownStore {
        fn backend(&self) -> &'static str {
            "down"
        }

        async fn add(&self, _: &str, _: Fields) -> Result<DocumentId, StoreError> {
            Err(StoreError::Connection("offline".to_string()))
        }

        async fn merge(&self, _: &str, _: &str, _: Fields) -> Result<(), StoreError> {
            Err(StoreError::Write("permission denied".to_string()))
        }

        async fn delete(&self, _: &str, _: &str) -> Result<(), StoreError> {
            Err(StoreError::Connection("offline".to_string()))
        }

        async fn query(&self, _: &Query) -> Result<Vec<Document>, StoreError> {
            Err(StoreError::Query("offline".to_string()))
        }

        async fn watch(&self, _: Query) -> Result<SnapshotStream, StoreError> {
            Err(StoreError::Subscription("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_errors_pass_through() {
        let repo = DocumentPostRepository::new(Arc::new(DownStore));

        let err = repo.create(draft("x", Locale::En)).await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Connection(msg)) if msg == "offline"));

        let err = repo
            .update(&PostId::new("x"), PostPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Write(_))));

        let err = repo.subscribe_to_all(Locale::En).await.unwrap_err();
        assert!(matches!(err, RepoError::Store(StoreError::Subscription(_))));

        assert!(repo.search("x", Locale::En).await.is_err());
    }
}

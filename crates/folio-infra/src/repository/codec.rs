//! Conversion between posts and stored documents.

use thiserror::Error;

use folio_core::document::{Document, Fields, Value};
use folio_core::domain::{
    Locale, NewPost, Post, PostId, PostPatch, Timestamp, normalize_category, normalize_tags,
};

/// Collection holding every post.
pub const POSTS: &str = "posts";

/// Stored field names.
pub mod field {
    pub const TITLE: &str = "title";
    pub const SLUG: &str = "slug";
    pub const SUMMARY: &str = "summary";
    pub const CONTENT: &str = "content";
    pub const COVER_IMAGE: &str = "coverImage";
    pub const CATEGORY: &str = "category";
    pub const TAGS: &str = "tags";
    pub const LOCALE: &str = "locale";
    pub const PUBLISHED_AT: &str = "publishedAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// Why a stored document is not a usable post.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("document {0} has no slug")]
    MissingSlug(String),

    #[error("document {id} has unsupported locale {locale:?}")]
    BadLocale { id: String, locale: Option<String> },
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Fields for a new document. Publication time defaults to `now`.
pub fn encode_new_post(input: NewPost, now: Timestamp) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field::TITLE.to_string(), Value::from(input.title));
    fields.insert(field::SLUG.to_string(), Value::from(input.slug));
    fields.insert(field::SUMMARY.to_string(), Value::from(input.summary));
    fields.insert(field::CONTENT.to_string(), Value::from(input.content));
    fields.insert(field::LOCALE.to_string(), Value::from(input.locale.as_str()));
    fields.insert(
        field::PUBLISHED_AT.to_string(),
        Value::Timestamp(input.published_at.unwrap_or(now)),
    );

    if let Some(cover) = optional_text(input.cover_image) {
        fields.insert(field::COVER_IMAGE.to_string(), Value::from(cover));
    }
    if let Some(category) = input.category.as_deref().and_then(normalize_category) {
        fields.insert(field::CATEGORY.to_string(), Value::from(category));
    }
    if let Some(tags) = input.tags.and_then(normalize_tags) {
        fields.insert(field::TAGS.to_string(), Value::from(tags));
    }

    fields
}

/// Fields to merge for a partial update, always stamping `updatedAt`.
///
/// Blank optional fields are written as nulls, which read back as absent.
pub fn encode_patch(patch: PostPatch, now: Timestamp) -> Fields {
    let mut fields = Fields::new();
    let mut put = |name: &str, value: Value| {
        fields.insert(name.to_string(), value);
    };

    if let Some(title) = patch.title {
        put(field::TITLE, Value::from(title));
    }
    if let Some(slug) = patch.slug {
        put(field::SLUG, Value::from(slug));
    }
    if let Some(summary) = patch.summary {
        put(field::SUMMARY, Value::from(summary));
    }
    if let Some(content) = patch.content {
        put(field::CONTENT, Value::from(content));
    }
    if let Some(locale) = patch.locale {
        put(field::LOCALE, Value::from(locale.as_str()));
    }
    if let Some(cover) = patch.cover_image {
        put(field::COVER_IMAGE, Value::from(optional_text(Some(cover))));
    }
    if let Some(category) = patch.category {
        put(field::CATEGORY, Value::from(normalize_category(&category)));
    }
    if let Some(tags) = patch.tags {
        put(field::TAGS, Value::from(normalize_tags(tags)));
    }
    put(field::UPDATED_AT, Value::Timestamp(now));

    fields
}

fn read_tags(value: Option<&Value>) -> Option<Vec<String>> {
    match value? {
        Value::Array(items) => normalize_tags(items.iter().filter_map(Value::as_str)),
        Value::String(single) => normalize_tags([single]),
        _ => None,
    }
}

/// Decode one document. A missing `publishedAt` reads as the current time.
pub fn decode_post(doc: Document) -> Result<Post, DecodeError> {
    let text = |name: &str| doc.get_str(name).unwrap_or_default().to_string();

    let slug = doc
        .get_str(field::SLUG)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| DecodeError::MissingSlug(doc.id.clone()))?
        .to_string();

    let raw_locale = doc.get_str(field::LOCALE);
    let locale: Locale = raw_locale
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| DecodeError::BadLocale {
            id: doc.id.clone(),
            locale: raw_locale.map(str::to_string),
        })?;

    Ok(Post {
        title: text(field::TITLE),
        summary: text(field::SUMMARY),
        content: text(field::CONTENT),
        cover_image: optional_text(doc.get_str(field::COVER_IMAGE).map(str::to_string)),
        category: doc.get_str(field::CATEGORY).and_then(normalize_category),
        tags: read_tags(doc.get(field::TAGS)),
        published_at: doc
            .get(field::PUBLISHED_AT)
            .and_then(Value::as_timestamp)
            .unwrap_or_else(Timestamp::now),
        updated_at: doc.get(field::UPDATED_AT).and_then(Value::as_timestamp),
        slug,
        locale,
        id: PostId::new(doc.id),
    })
}

/// Decode a snapshot, skipping documents that are not valid posts.
pub fn decode_posts(docs: Vec<Document>) -> Vec<Post> {
    docs.into_iter()
        .filter_map(|doc| match decode_post(doc) {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping malformed post document");
                None
            }
        })
        .collect()
}

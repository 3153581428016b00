use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Locale, Timestamp};
use crate::error::DomainError;

/// Store-assigned post identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub String);

impl PostId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Post entity - one article in one locale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub locale: Locale,
    pub published_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// Input for creating a post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub locale: Locale,
    /// Defaults to the write time. Imports carry the original date.
    pub published_at: Option<Timestamp>,
}

impl NewPost {
    pub fn new(
        title: impl Into<String>,
        slug: impl Into<String>,
        summary: impl Into<String>,
        content: impl Into<String>,
        locale: Locale,
    ) -> Self {
        Self {
            title: title.into(),
            slug: slug.into(),
            summary: summary.into(),
            content: content.into(),
            cover_image: None,
            category: None,
            tags: None,
            locale,
            published_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_cover_image(mut self, cover_image: impl Into<String>) -> Self {
        self.cover_image = Some(cover_image.into());
        self
    }

    pub fn published_at(mut self, at: Timestamp) -> Self {
        self.published_at = Some(at);
        self
    }

    /// Editorial checks for callers that accept user input.
    ///
    /// The repository never calls this; writers decide whether to.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::Validation("title must not be empty".to_string()));
        }
        validate_slug(&self.slug)
    }
}

/// Partial update. `None` leaves a field untouched.
///
/// An empty `category` or an empty/blank `tags` list clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostPatch {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub locale: Option<Locale>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(DomainError::Validation("title must not be empty".to_string()));
            }
        }
        match &self.slug {
            Some(slug) => validate_slug(slug),
            None => Ok(()),
        }
    }
}

fn validate_slug(slug: &str) -> Result<(), DomainError> {
    if slug.is_empty() {
        return Err(DomainError::Validation("slug must not be empty".to_string()));
    }
    if let Some(bad) = slug
        .chars()
        .find(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | '%' | '&'))
    {
        return Err(DomainError::Validation(format!(
            "slug contains a character that is not URL-safe: {bad:?}"
        )));
    }
    Ok(())
}

/// Trim tags and drop blanks. An empty result means "no tags".
pub fn normalize_tags<I, S>(tags: I) -> Option<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let tags: Vec<String> = tags
        .into_iter()
        .map(|tag| tag.as_ref().trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect();

    if tags.is_empty() { None } else { Some(tags) }
}

/// Trim a category. Blank means "uncategorized".
pub fn normalize_category(category: &str) -> Option<String> {
    let category = category.trim();
    if category.is_empty() {
        None
    } else {
        Some(category.to_string())
    }
}

//! Domain to wire conversions.

use folio_core::domain::{Locale, Post};
use folio_core::taxonomy::YearGroup;
use folio_shared::dto::{ArchiveYearResponse, PostResponse, TermCount};
use std::collections::BTreeMap;

use crate::middleware::error::AppError;

/// Locale path segment. Unknown codes are a 404, the page does not exist.
pub fn parse_locale(raw: &str) -> Result<Locale, AppError> {
    raw.parse::<Locale>().map_err(AppError::from)
}

pub fn post_view(post: Post) -> PostResponse {
    PostResponse {
        id: post.id.0,
        title: post.title,
        slug: post.slug,
        summary: post.summary,
        content: post.content,
        cover_image: post.cover_image,
        category: post.category,
        tags: post.tags,
        locale: post.locale.to_string(),
        published_at: post.published_at.to_string(),
        updated_at: post.updated_at.map(|t| t.to_string()),
    }
}

pub fn post_views(posts: Vec<Post>) -> Vec<PostResponse> {
    posts.into_iter().map(post_view).collect()
}

pub fn archive_view(group: YearGroup) -> ArchiveYearResponse {
    ArchiveYearResponse {
        year: group.year,
        posts: post_views(group.posts),
    }
}

/// Pair each name with its count. Names missing from `counts` report zero.
pub fn term_counts(names: Vec<String>, counts: &BTreeMap<String, usize>) -> Vec<TermCount> {
    names
        .into_iter()
        .map(|name| {
            let count = counts.get(&name).copied().unwrap_or(0);
            TermCount { name, count }
        })
        .collect()
}

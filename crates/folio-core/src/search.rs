//! Naive full-text filter over an in-memory set of posts.
//!
//! No index, no ranking: results keep the order of the input, which callers
//! feed newest first.

use crate::domain::Post;

/// Case-insensitive substring match over title, summary, content, tags and
/// category. A blank term matches nothing.
pub fn filter_posts<I>(posts: I, term: &str) -> Vec<Post>
where
    I: IntoIterator<Item = Post>,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    posts
        .into_iter()
        .filter(|post| matches_term(post, &needle))
        .collect()
}

/// `needle` must already be lowercased.
pub fn matches_term(post: &Post, needle: &str) -> bool {
    let contains = |haystack: &str| haystack.to_lowercase().contains(needle);

    contains(&post.title)
        || contains(&post.summary)
        || contains(&post.content)
        || post.category.as_deref().is_some_and(|c| contains(c))
        || post
            .tags
            .as_deref()
            .unwrap_or_default()
            .iter()
            .any(|tag| contains(tag))
}

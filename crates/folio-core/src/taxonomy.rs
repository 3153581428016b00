//! Category, tag and archive groupings derived from post snapshots.
//!
//! Everything here is recomputed from scratch on each call.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::domain::Post;

/// Distinct categories in `String` order (byte-wise, case-sensitive).
pub fn distinct_categories<'a, I>(posts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .filter_map(|post| post.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags in `String` order. `"b"` and `"B"` stay separate and `"B"`
/// sorts first.
pub fn distinct_tags<'a, I>(posts: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a Post>,
{
    posts
        .into_iter()
        .flat_map(|post| post.tags.iter().flatten().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Number of posts per category.
pub fn category_counts<'a, I>(posts: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut counts = BTreeMap::new();
    for category in posts.into_iter().filter_map(|post| post.category.as_ref()) {
        *counts.entry(category.clone()).or_insert(0) += 1;
    }
    counts
}

/// Number of posts per tag. A post listing a tag twice counts once.
pub fn tag_counts<'a, I>(posts: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a Post>,
{
    let mut counts = BTreeMap::new();
    for post in posts {
        let unique: BTreeSet<&String> = post.tags.iter().flatten().collect();
        for tag in unique {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }
    counts
}

/// Posts published in one calendar year.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearGroup {
    pub year: i32,
    pub posts: Vec<Post>,
}

/// Group by UTC publication year, newest year first. Posts keep their input
/// order inside each year.
pub fn archive_by_year<I>(posts: I) -> Vec<YearGroup>
where
    I: IntoIterator<Item = Post>,
{
    let mut years: BTreeMap<i32, Vec<Post>> = BTreeMap::new();
    for post in posts {
        years.entry(post.published_at.year()).or_default().push(post);
    }

    years
        .into_iter()
        .rev()
        .map(|(year, posts)| YearGroup { year, posts })
        .collect()
}

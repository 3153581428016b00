//! Data Transfer Objects - request/response types for the API.

use serde::{Deserialize, Serialize};

/// A post as served to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub summary: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub locale: String,
    /// RFC 3339.
    pub published_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Request to create a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub locale: String,
    /// RFC 3339. Defaults to the time of the request.
    pub published_at: Option<String>,
}

/// Request to update a post. Absent fields stay as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub locale: Option<String>,
}

/// Identifier of a newly created post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: String,
}

/// A category or tag with the number of posts carrying it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermCount {
    pub name: String,
    pub count: usize,
}

/// Posts of one publication year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveYearResponse {
    pub year: i32,
    pub posts: Vec<PostResponse>,
}

/// Search results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub term: String,
    pub total: usize,
    pub results: Vec<PostResponse>,
}

//! Read-only post endpoints: feeds, single posts, taxonomy, archives and search.

use actix_web::{HttpResponse, web};
use serde::Deserialize;

use folio_core::ports::Subscription;
use folio_core::taxonomy;
use folio_shared::ApiResponse;
use folio_shared::dto::SearchResponse;

use super::views::{archive_view, parse_locale, post_view, post_views, term_counts};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// Take the current state of a live feed and release it.
async fn first_snapshot<T>(mut feed: Subscription<T>) -> AppResult<T>
where
    T: Send + 'static,
{
    let first = feed.next_snapshot().await;
    feed.close();
    match first {
        Some(snapshot) => Ok(snapshot?),
        None => Err(AppError::Internal(
            "live feed ended before its first snapshot".to_string(),
        )),
    }
}

/// GET /api/{locale}/posts
pub async fn list_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let posts = state.posts.list_posts(locale).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_views(posts))))
}

/// GET /api/{locale}/posts/{slug}
pub async fn get_post(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, slug) = path.into_inner();
    let locale = parse_locale(&locale)?;

    let post = state
        .posts
        .get_by_slug(&slug, Some(locale))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No post '{}' in {}", slug, locale)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_view(post))))
}

/// GET /api/{locale}/categories
pub async fn list_categories(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let names = state.posts.list_categories(Some(locale)).await?;
    let posts = state.posts.list_posts(locale).await?;
    let counts = taxonomy::category_counts(&posts);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(term_counts(names, &counts))))
}

/// GET /api/{locale}/categories/{category}/posts
pub async fn category_posts(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, category) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let feed = state.posts.subscribe_by_category(&category, locale).await?;
    let posts = first_snapshot(feed).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_views(posts))))
}

/// GET /api/{locale}/tags
pub async fn list_tags(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let names = state.posts.list_tags(Some(locale)).await?;
    let posts = state.posts.list_posts(locale).await?;
    let counts = taxonomy::tag_counts(&posts);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(term_counts(names, &counts))))
}

/// GET /api/{locale}/tags/{tag}/posts
pub async fn tag_posts(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, tag) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let feed = state.posts.subscribe_by_tag(&tag, locale).await?;
    let posts = first_snapshot(feed).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_views(posts))))
}

/// GET /api/{locale}/archives
pub async fn archives(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let posts = state.posts.list_posts(locale).await?;
    let years: Vec<_> = taxonomy::archive_by_year(posts)
        .into_iter()
        .map(archive_view)
        .collect();
    Ok(HttpResponse::Ok().json(ApiResponse::ok(years)))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// GET /api/{locale}/search?q=term
pub async fn search(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SearchQuery>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let term = query.into_inner().q.trim().to_string();
    let results = state.posts.search(&term, locale).await?;

    tracing::debug!(term = %term, hits = results.len(), "Search served");

    Ok(HttpResponse::Ok().json(ApiResponse::ok(SearchResponse {
        total: results.len(),
        term,
        results: post_views(results),
    })))
}

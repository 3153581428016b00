//! Live feeds over server-sent events.
//!
//! Each connection holds one repository subscription. Every snapshot goes out
//! as a `data:` frame carrying the full JSON list (or the single post, or
//! `null`). Store failures go out as `event: error` frames and the stream
//! keeps waiting. The subscription is released when the client disconnects
//! and actix drops the body stream.

use std::convert::Infallible;

use actix_web::{HttpResponse, http::header, web};
use futures::StreamExt;
use serde::Serialize;
use serde_json::json;

use folio_core::ports::Subscription;

use super::views::{parse_locale, post_view, post_views};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn data_frame<T: Serialize>(snapshot: &T) -> String {
    match serde_json::to_string(snapshot) {
        Ok(body) => format!("data: {}\n\n", body),
        Err(e) => error_frame(&e.to_string()),
    }
}

fn error_frame(detail: &str) -> String {
    format!("event: error\ndata: {}\n\n", json!({ "detail": detail }))
}

/// Turn a subscription into an SSE response.
fn event_stream<T>(feed: Subscription<T>) -> HttpResponse
where
    T: Serialize + Send + 'static,
{
    let frames = feed.map(|item| {
        let frame = match item {
            Ok(snapshot) => data_frame(&snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Live feed error");
                error_frame(&e.to_string())
            }
        };
        Ok::<_, Infallible>(web::Bytes::from(frame))
    });

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(frames)
}

/// GET /api/{locale}/live/posts
pub async fn live_posts(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let locale = parse_locale(&path)?;
    let feed = state.posts.subscribe_to_all(locale).await?;
    tracing::info!(%locale, "Live feed opened");
    Ok(event_stream(feed.map_snapshots(post_views)))
}

/// GET /api/{locale}/live/posts/{slug}
pub async fn live_post(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, slug) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let feed = state.posts.subscribe_to_one(locale, &slug).await?;
    tracing::info!(%locale, slug = %slug, "Live post opened");
    Ok(event_stream(feed.map_snapshots(|post| post.map(post_view))))
}

/// GET /api/{locale}/live/categories/{category}
pub async fn live_category(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, category) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let feed = state.posts.subscribe_by_category(&category, locale).await?;
    Ok(event_stream(feed.map_snapshots(post_views)))
}

/// GET /api/{locale}/live/tags/{tag}
pub async fn live_tag(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> AppResult<HttpResponse> {
    let (locale, tag) = path.into_inner();
    let locale = parse_locale(&locale)?;
    let feed = state.posts.subscribe_by_tag(&tag, locale).await?;
    Ok(event_stream(feed.map_snapshots(post_views)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames() {
        assert_eq!(data_frame(&Vec::<u8>::new()), "data: []\n\n");
        assert_eq!(data_frame(&Option::<u8>::None), "data: null\n\n");
        assert_eq!(
            error_frame("permission denied"),
            "event: error\ndata: {\"detail\":\"permission denied\"}\n\n"
        );
    }
}

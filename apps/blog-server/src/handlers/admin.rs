//! Administrative writes. Every route requires an admin bearer token.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};

use folio_core::domain::{
    Locale, NewPost, PostId, PostPatch, Timestamp, normalize_category, normalize_tags,
};
use folio_shared::dto::{CreatePostRequest, CreatedResponse, UpdatePostRequest};

use crate::middleware::auth::AdminIdentity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn parse_body_locale(raw: &str) -> AppResult<Locale> {
    raw.parse::<Locale>()
        .map_err(|_| AppError::Validation(vec![format!("locale: unsupported value '{}'", raw)]))
}

fn parse_published_at(raw: &str) -> AppResult<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| Timestamp::from(at.with_timezone(&Utc)))
        .map_err(|e| AppError::BadRequest(format!("publishedAt: {}", e)))
}

fn new_post_from(req: CreatePostRequest) -> AppResult<NewPost> {
    let locale = parse_body_locale(&req.locale)?;
    let mut post = NewPost::new(req.title, req.slug, req.summary, req.content, locale);
    post.cover_image = req.cover_image.filter(|c| !c.trim().is_empty());
    post.category = req.category.as_deref().and_then(normalize_category);
    post.tags = req.tags.and_then(normalize_tags);
    if let Some(raw) = req.published_at.as_deref() {
        post = post.published_at(parse_published_at(raw)?);
    }
    post.validate()?;
    Ok(post)
}

fn patch_from(req: UpdatePostRequest) -> AppResult<PostPatch> {
    let patch = PostPatch {
        title: req.title,
        slug: req.slug,
        summary: req.summary,
        content: req.content,
        cover_image: req.cover_image,
        category: req.category,
        tags: req.tags,
        locale: req.locale.as_deref().map(parse_body_locale).transpose()?,
    };
    if patch.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }
    patch.validate()?;
    Ok(patch)
}

/// POST /api/admin/posts
pub async fn create_post(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let input = new_post_from(body.into_inner())?;
    let slug = input.slug.clone();
    let id = state.posts.create(input).await?;

    tracing::info!(admin = %admin.subject, post_id = %id, slug = %slug, "Post created");

    Ok(HttpResponse::Created().json(CreatedResponse { id: id.0 }))
}

/// PATCH /api/admin/posts/{id}
pub async fn update_post(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let id = PostId::new(path.into_inner());
    let patch = patch_from(body.into_inner())?;
    state.posts.update(&id, patch).await?;

    tracing::info!(admin = %admin.subject, post_id = %id, "Post updated");

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/admin/posts/{id}
pub async fn delete_post(
    admin: AdminIdentity,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = PostId::new(path.into_inner());
    state.posts.delete(&id).await?;

    tracing::info!(admin = %admin.subject, post_id = %id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

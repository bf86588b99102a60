//! Post CRUD. Every route here sits behind the auth gate.

use actix_web::{HttpResponse, web};

use postboard_core::RepoError;
use postboard_core::domain::{Post, PostPatch};
use postboard_shared::dto::CreatePostRequest;

use super::parse_id;
use crate::middleware::{AppError, AppResult, Identity};
use crate::state::AppState;

fn post_not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// POST /api/v1/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let post = Post::create(
        req.title.unwrap_or_default(),
        req.text.unwrap_or_default(),
        req.author.unwrap_or_default(),
    )?;

    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %saved.id, caller = %identity.user_id, "Post created");

    Ok(HttpResponse::Created().json(saved))
}

/// GET /api/v1/posts
pub async fn list(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let posts = state.posts.find_all().await?;
    tracing::debug!(count = posts.len(), caller = %identity.user_id, "Listing posts");

    Ok(HttpResponse::Ok().json(posts))
}

/// GET /api/v1/posts/{id}
pub async fn get(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state.posts.find_by_id(id).await?.ok_or_else(post_not_found)?;

    Ok(HttpResponse::Ok().json(post))
}

/// PATCH /api/v1/posts/{id}
///
/// Merges any subset of fields permitted by the configured patch policy.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
    body: web::Json<PostPatch>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let mut post = state.posts.find_by_id(id).await?.ok_or_else(post_not_found)?;

    post.apply_patch(body.into_inner(), &state.post_patch)?;
    let saved = state.posts.save(post).await?;
    tracing::info!(post_id = %id, caller = %identity.user_id, "Post updated");

    Ok(HttpResponse::Ok().json(saved))
}

/// DELETE /api/v1/posts/{id}
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;

    state.posts.delete(id).await.map_err(|e| match e {
        RepoError::NotFound => post_not_found(),
        other => other.into(),
    })?;
    tracing::info!(post_id = %id, caller = %identity.user_id, "Post deleted");

    Ok(HttpResponse::NoContent().finish())
}

/// PATCH /api/v1/posts/{id}/view
pub async fn view(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let id = parse_id(&path)?;
    let post = state
        .posts
        .increment_views(id)
        .await?
        .ok_or_else(post_not_found)?;

    Ok(HttpResponse::Ok().json(post))
}

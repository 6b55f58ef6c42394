use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Redirect,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::Actor,
    error::ApiError,
    pagination::Pagination,
    permissions::{self, Action},
    posts::{
        dto::{CreatePostRequest, PatchPostRequest, PostOut, UpdatePostRequest},
        repo::{Post, PostChanges},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post)
                .put(update_post)
                .patch(patch_post)
                .delete(delete_post),
        )
        .route("/posts/:id/image", get(get_image).post(upload_image))
        .layer(DefaultBodyLimit::max(20 * 1024 * 1024)) // 20MB
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let posts = Post::list(&state.db, p.limit, p.offset)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(posts.into_iter().map(PostOut::from).collect()))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PostOut>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    Ok(Json(post.into()))
}

#[instrument(skip(state, actor, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, HeaderMap, Json<PostOut>), ApiError> {
    let author = payload.validate(&actor)?;

    let post = Post::create(&state.db, author.id, &payload.title, &payload.text)
        .await
        .map_err(ApiError::internal)?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/api/posts/{}", post.id).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }

    info!(post_id = %post.id, author_id = %author.id, "post created");
    Ok((StatusCode::CREATED, headers, Json(post.into())))
}

#[instrument(skip(state, actor, payload))]
pub async fn update_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<PostOut>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    if !permissions::author_or_admin_object(&actor, Action::Update, post.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this post",
        ));
    }
    payload.validate()?;

    let updated = Post::update(
        &state.db,
        id,
        PostChanges {
            title: Some(payload.title),
            text: Some(payload.text),
        },
    )
    .await
    .map_err(ApiError::internal)?
    .ok_or(ApiError::NotFound("post"))?;

    info!(post_id = %id, "post updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, actor, payload))]
pub async fn patch_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<PatchPostRequest>,
) -> Result<Json<PostOut>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    if !permissions::author_or_admin_object(&actor, Action::PartialUpdate, post.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this post",
        ));
    }
    payload.validate()?;

    let updated = Post::update(
        &state.db,
        id,
        PostChanges {
            title: payload.title,
            text: payload.text,
        },
    )
    .await
    .map_err(ApiError::internal)?
    .ok_or(ApiError::NotFound("post"))?;

    info!(post_id = %id, "post updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, actor))]
pub async fn delete_post(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    if !permissions::author_or_admin_object(&actor, Action::Delete, post.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to delete this post",
        ));
    }

    if let Some(key) = &post.image_key {
        if let Err(e) = state.storage.delete_object(key).await {
            warn!(error = %e, %key, "failed to delete post image; continuing");
        }
    }

    Post::delete(&state.db, id).await.map_err(ApiError::internal)?;
    info!(post_id = %id, "post deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /posts/:id/image (multipart, field `image`)
#[instrument(skip(state, actor, mp))]
pub async fn upload_image(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    mut mp: Multipart,
) -> Result<Json<PostOut>, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    if !permissions::author_or_admin_object(&actor, Action::Update, post.author_id) {
        return Err(ApiError::permission_denied(
            "you do not have permission to modify this post",
        ));
    }

    let mut upload = None;
    while let Ok(Some(field)) = mp.next_field().await {
        if field.name() == Some("image") {
            let content_type = field
                .content_type()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "application/octet-stream".into());
            let data = field.bytes().await.map_err(ApiError::internal)?;
            upload = Some((data, content_type));
            break;
        }
    }
    let Some((data, content_type)) = upload else {
        return Err(ApiError::validation("image", "image field is required"));
    };

    let key = format!("post_images/{}", Uuid::new_v4());
    state
        .storage
        .put_object(&key, data, &content_type)
        .await
        .map_err(ApiError::internal)?;

    // replace: drop the old object once the new one is in place
    if let Some(old_key) = &post.image_key {
        if let Err(e) = state.storage.delete_object(old_key).await {
            warn!(error = %e, key = %old_key, "failed to delete replaced image; continuing");
        }
    }

    let updated = Post::set_image_key(&state.db, id, Some(&key))
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;

    info!(post_id = %id, %key, "post image uploaded");
    Ok(Json(updated.into()))
}

/// GET /posts/:id/image, 302 to a presigned URL
#[instrument(skip(state))]
pub async fn get_image(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Redirect, ApiError> {
    let post = Post::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or(ApiError::NotFound("post"))?;
    let key = post.image_key.as_deref().ok_or(ApiError::NotFound("image"))?;

    let url = state
        .storage
        .presign_get(key, 600)
        .await
        .map_err(ApiError::internal)?;
    Ok(Redirect::temporary(&url))
}
